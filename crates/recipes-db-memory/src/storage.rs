use std::sync::Arc;

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use recipes_core::{Recipe, RecipeDraft, RecipeId};
use recipes_storage::{RecipeStorage, StorageError, StorageResult};

/// In-memory recipe storage using papaya lock-free HashMap.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    data: Arc<PapayaHashMap<RecipeId, Recipe>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecipeStorage for InMemoryStorage {
    async fn insert(&self, recipe: &Recipe) -> StorageResult<()> {
        let guard = self.data.pin();
        guard
            .try_insert(recipe.id, recipe.clone())
            .map(|_| ())
            .map_err(|_| StorageError::already_exists(recipe.id.to_string()))
    }

    async fn find_by_id(&self, id: &RecipeId) -> StorageResult<Option<Recipe>> {
        Ok(self.data.pin().get(id).cloned())
    }

    async fn find_all(&self) -> StorageResult<Vec<Recipe>> {
        let guard = self.data.pin();
        let mut all: Vec<Recipe> = guard.iter().map(|(_, r)| r.clone()).collect();
        all.sort_by(|a, b| (a.published_at, a.id).cmp(&(b.published_at, b.id)));
        Ok(all)
    }

    async fn update_fields(&self, id: &RecipeId, draft: &RecipeDraft) -> StorageResult<Recipe> {
        let guard = self.data.pin();
        guard
            .update(*id, |current| {
                let mut next = current.clone();
                next.apply(draft.clone());
                next
            })
            .cloned()
            .ok_or_else(|| StorageError::not_found(id.to_string()))
    }

    async fn delete(&self, id: &RecipeId) -> StorageResult<()> {
        match self.data.pin().remove(id) {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found(id.to_string())),
        }
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.len() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
