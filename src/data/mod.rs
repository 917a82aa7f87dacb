pub mod data_map;
pub mod enrichment;
pub mod placeholder;
