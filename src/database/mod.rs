pub mod manager;
pub mod memory;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager, Reference};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{LocationStore, ObservationStore, StoreHealth, TaxonomyStore};
