// Data model shared by rules, driver and store

mod flags;
pub mod tables;
mod value;
mod write;

pub use flags::FactFlag;
pub use value::{SourceRow, Value};
pub use write::{DerivedWrite, Key, WriteOp};
