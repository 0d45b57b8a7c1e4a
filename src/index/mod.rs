pub mod sqlite;
pub mod store;

pub use sqlite::SqliteIndexStore;
pub use store::IndexStore;
