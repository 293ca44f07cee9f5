pub mod connection;
pub mod properties;
pub mod seller_updates;

pub use connection::{init_db, Database};
