//! # recipes-storage
//!
//! Storage abstraction layer for the recipes server.
//!
//! This crate defines the [`RecipeStorage`] trait every record store
//! implements, together with [`StorageError`]. It contains no backend;
//! those live in `recipes-db-memory` and `recipes-db-postgres`.
//!
//! ## Example
//!
//! ```ignore
//! use recipes_storage::{RecipeStorage, StorageResult};
//! use recipes_core::Recipe;
//!
//! async fn names(storage: &dyn RecipeStorage) -> StorageResult<Vec<String>> {
//!     let all = storage.find_all().await?;
//!     Ok(all.into_iter().map(|r| r.name).collect())
//! }
//! ```

mod error;
mod traits;

pub use error::StorageError;
pub use traits::RecipeStorage;

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared storage trait object.
pub type DynStorage = std::sync::Arc<dyn RecipeStorage>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{DynStorage, RecipeStorage, StorageError, StorageResult};
}
