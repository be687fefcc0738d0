pub mod infrastructure;
pub mod ports;
pub mod postgres;

pub use postgres::{PoolSettings, PoolStats, PostgresDatabase};
