pub mod defaults;
pub mod kv;
pub mod layout;
pub mod profile_store;
pub mod settings;

pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use layout::StorageLayout;
pub use profile_store::ProfileStore;
pub use settings::Settings;
