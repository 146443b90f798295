//! This bench amalgamates a library whose units form a long include chain,
//! with every unit also pulling in a shared base header.

#![allow(missing_docs)]

use std::{fs, io, path::Path};

use criterion::{Criterion, criterion_group, criterion_main};
use single_header::{Amalgamator, Config, Layout};
use tempfile::TempDir;

const UNITS: usize = 200;

/// Generates `UNITS` chained units, each with an implementation file.
fn preseed_library(root: &Path) {
    let include = root.join("include");
    let src = root.join("src");
    fs::create_dir_all(&include).unwrap();
    fs::create_dir_all(&src).unwrap();
    fs::write(include.join("base.h"), "typedef int base_t;\n").unwrap();

    for i in 0..UNITS {
        let next = if i + 1 < UNITS {
            format!("#include \"unit{}.h\"\n", i + 1)
        } else {
            String::new()
        };
        fs::write(
            include.join(format!("unit{i}.h")),
            format!("#include \"base.h\"\n{next}__AD_LINKAGE base_t unit{i}(void);\n"),
        )
        .unwrap();
        fs::write(
            src.join(format!("unit{i}.c")),
            format!("__AD_LINKAGE base_t unit{i}(void) {{ return {i}; }}\n"),
        )
        .unwrap();
    }
}

fn amalgamate_chain(c: &mut Criterion) {
    let tmp_dir = TempDir::new().unwrap();
    preseed_library(tmp_dir.path());
    let config = Config::default();
    let amalgamator = Amalgamator::new(Layout::new(tmp_dir.path(), &config), config);
    let entry = tmp_dir.path().join("include").join("unit0.h");

    c.bench_function("amalgamate chain", |b| {
        b.iter(|| {
            amalgamator
                .amalgamate(&entry, "chain", io::sink())
                .unwrap();
        });
    });
}

criterion_group!(benches, amalgamate_chain);
criterion_main!(benches);
