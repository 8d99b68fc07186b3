//! Table materialization for COLUMN values.

mod cache;
mod decoder;

pub use cache::{MaterializedTable, TableCache};
pub(crate) use decoder::table_label;
pub use decoder::{RawColumn, RawTable, TableDecoder, VoTableDecoder};
