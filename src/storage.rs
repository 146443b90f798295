/// Flattening the include graph into one output.
pub mod amalgamator;
mod layout;

pub use amalgamator::{Amalgamator, Error, Summary, amalgamate};
pub use layout::{Layout, UnitFiles};
