//! Cache-aside reader for the full recipe listing.
//!
//! The whole collection is cached under a single key. Reads populate it
//! on a miss; every successful create, update or delete removes it. There
//! is no lock between a write and its invalidation, so a listing read
//! that races a write may briefly return the previous collection.

use recipes_api::ApiError;
use recipes_core::Recipe;
use recipes_storage::{RecipeStorage, StorageError};
use thiserror::Error;
use tracing::{debug, warn};

use super::backend::{CacheBackend, CacheError, CacheLookup};

/// Cache key holding the serialized recipe collection.
pub const LISTING_KEY: &str = "recipes-listing";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("cached listing is corrupted: {0}")]
    Corrupted(#[source] serde_json::Error),

    #[error("failed to encode listing: {0}")]
    Encode(#[source] serde_json::Error),
}

pub struct RecipeListingCache {
    backend: CacheBackend,
}

impl RecipeListingCache {
    pub fn new(backend: CacheBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &CacheBackend {
        &self.backend
    }

    /// Returns every recipe, from the cache when possible.
    ///
    /// On a miss the store is queried and the result cached with no
    /// expiry. A cache failure other than a miss is returned as is; the
    /// store is not consulted as a fallback.
    pub async fn listing(&self, storage: &dyn RecipeStorage) -> Result<Vec<Recipe>, ListingError> {
        match self.backend.get(LISTING_KEY).await {
            CacheLookup::Hit(bytes) => match serde_json::from_slice::<Vec<Recipe>>(&bytes) {
                Ok(recipes) => {
                    debug!(count = recipes.len(), "listing served from cache");
                    Ok(recipes)
                }
                Err(e) => {
                    warn!(error = %e, "discarding corrupted cached listing");
                    if let Err(del) = self.backend.delete(LISTING_KEY).await {
                        warn!(error = %del, "failed to delete corrupted cached listing");
                    }
                    Err(ListingError::Corrupted(e))
                }
            },
            CacheLookup::Miss => {
                let recipes = storage.find_all().await?;
                let encoded = serde_json::to_vec(&recipes).map_err(ListingError::Encode)?;
                self.backend.set(LISTING_KEY, encoded).await?;
                debug!(count = recipes.len(), "listing cache populated");
                Ok(recipes)
            }
            CacheLookup::Error(e) => Err(e.into()),
        }
    }

    /// Drops the cached listing. Call only after a write has succeeded.
    pub async fn invalidate(&self) -> Result<(), CacheError> {
        self.backend.delete(LISTING_KEY).await?;
        debug!("listing cache invalidated");
        Ok(())
    }
}

impl From<ListingError> for ApiError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::Storage(e) => e.into(),
            ListingError::Cache(e) => e.into(),
            ListingError::Corrupted(e) => {
                ApiError::infrastructure("cache_corrupted", format!("cached listing: {e}"))
            }
            ListingError::Encode(e) => {
                ApiError::infrastructure("encode", format!("recipe listing: {e}"))
            }
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::infrastructure("cache", err.to_string())
    }
}
