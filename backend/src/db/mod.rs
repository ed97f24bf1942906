pub mod connection;
pub mod connections;
pub mod memory;
pub mod migrations;
pub mod store;
pub mod users;

pub use connection::{get_db_pool, DatabaseConfig};
pub use connections::PgConnectionStore;
pub use memory::{InMemoryConnectionStore, InMemoryUserDirectory};
pub use store::{ConnectionStore, UserDirectory};
pub use users::PgUserDirectory;
