pub mod error;
pub mod iterator;
pub mod kv;
pub mod memory;
pub mod store;
pub mod utils;
