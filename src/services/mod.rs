pub mod enrichment;
pub mod loader;
pub mod map;
pub mod positions;
pub mod weather;
