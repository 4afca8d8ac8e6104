//! Configuration is split into:
//! - `types.rs` (data structures + defaults)
//! - `load.rs`  (IO: file loading + env overrides)

mod load;
mod types;

pub use load::{load_default, load_from};
pub use types::*;
