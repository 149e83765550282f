//! The record store seam.

use async_trait::async_trait;
use recipes_core::{Recipe, RecipeDraft, RecipeId};

use crate::StorageResult;

/// Durable storage for recipe documents.
///
/// Implementations must be safe to share across request tasks. None of
/// the operations touch the listing cache; invalidation is the caller's
/// job once a mutation has returned `Ok`.
#[async_trait]
pub trait RecipeStorage: Send + Sync {
    /// Stores a new recipe under its already-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the id is taken.
    async fn insert(&self, recipe: &Recipe) -> StorageResult<()>;

    /// Reads a single recipe. `Ok(None)` when no record has this id.
    async fn find_by_id(&self, id: &RecipeId) -> StorageResult<Option<Recipe>>;

    /// Reads every recipe, ordered by publication time then id.
    async fn find_all(&self) -> StorageResult<Vec<Recipe>>;

    /// Replaces name, tags, ingredients and instructions of an existing
    /// recipe and returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no record matched `id`.
    async fn update_fields(&self, id: &RecipeId, draft: &RecipeDraft) -> StorageResult<Recipe>;

    /// Removes a recipe.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no record matched `id`.
    async fn delete(&self, id: &RecipeId) -> StorageResult<()>;

    /// Number of stored recipes.
    async fn count(&self) -> StorageResult<u64>;

    /// Cheap reachability check used by `/readyz`.
    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
