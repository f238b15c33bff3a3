// Service exports
pub mod memory;
pub mod postgres;
pub mod store;
pub mod telegram;

pub use memory::InMemoryProfileStore;
pub use postgres::PostgresProfileStore;
pub use store::{ProfileStore, StoreError};
pub use telegram::{TelegramClient, TelegramError, Update};
