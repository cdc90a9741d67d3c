pub mod errors;
pub mod integrity;
pub mod linkage;
pub mod mempool;
pub mod merkle;
pub mod orphans;
pub mod receipt;
pub mod seal;
pub mod snapshot;
pub mod tx_index;
