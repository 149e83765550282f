//! In-memory recipe storage backend.
//!
//! Implements [`RecipeStorage`] on top of a papaya lock-free map. Data
//! lives for the lifetime of the process.
//!
//! # Example
//!
//! ```ignore
//! use recipes_db_memory::InMemoryStorage;
//! use recipes_storage::RecipeStorage;
//!
//! let storage = InMemoryStorage::new();
//! storage.insert(&recipe).await?;
//! ```

mod storage;

pub use recipes_storage::{RecipeStorage, StorageError};
pub use storage::InMemoryStorage;

/// Creates a new shared in-memory storage instance.
pub fn create_storage() -> recipes_storage::DynStorage {
    std::sync::Arc::new(InMemoryStorage::new())
}
