/// Database connectivity and schema management
pub mod migrations;
pub mod pool;

pub use pool::{close_pool, create_pool, health_check, DatabaseConfig};
