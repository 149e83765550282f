//! Recipe document and the client payload used to create or update one.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{CoreError, CoreResult};
use crate::id::RecipeId;

/// A stored recipe.
///
/// `id` and `published_at` are assigned by the server on creation and
/// never change afterwards. Everything else is replaced wholesale by an
/// update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

impl Recipe {
    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim().to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }

    /// Replace the mutable fields with those of `draft`, keeping id and
    /// publication time.
    pub fn apply(&mut self, draft: RecipeDraft) {
        self.name = draft.name;
        self.tags = draft.tags;
        self.ingredients = draft.ingredients;
        self.instructions = draft.instructions;
    }
}

/// Client-supplied recipe body for create and update.
///
/// Unknown fields (including `id` and `publishedAt`) are ignored so a
/// client may send back a full [`Recipe`] it previously fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl RecipeDraft {
    /// Check the payload shape.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecipe`] when the name is blank or a
    /// tag is blank.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::invalid_recipe("name must not be empty"));
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(CoreError::invalid_recipe("tags must not be empty strings"));
        }
        Ok(())
    }

    /// Turn a validated draft into a new recipe.
    pub fn into_recipe(self, id: RecipeId, published_at: OffsetDateTime) -> Recipe {
        Recipe {
            id,
            name: self.name,
            tags: self.tags,
            ingredients: self.ingredients,
            instructions: self.instructions,
            published_at,
        }
    }
}

/// Recipes carrying `tag` (case-insensitive), each at most once, in the
/// order given.
pub fn filter_by_tag(recipes: Vec<Recipe>, tag: &str) -> Vec<Recipe> {
    recipes.into_iter().filter(|r| r.has_tag(tag)).collect()
}
