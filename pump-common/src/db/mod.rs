//! Persistence: models, migrations and storage backends

pub mod init;
pub mod migrations;
pub mod models;
pub mod postgres;
pub mod sqlite;
pub mod store;

pub use init::*;
pub use migrations::*;
pub use models::*;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
pub use store::*;
