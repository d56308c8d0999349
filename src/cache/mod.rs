pub mod memory;
pub mod traits;

pub use memory::MemoryRunCache;
pub use traits::{CacheError, RunCache, RunRecord};
