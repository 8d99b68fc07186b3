//! XML utilities.

mod utils;

pub use utils::*;
