//! Startup data: the admin account and optional seed recipes.

use std::path::Path;

use anyhow::{Context, anyhow};
use recipes_auth::User;
use recipes_auth::password::hash_password;
use recipes_auth::storage::UserStorage;
use recipes_core::{RecipeDraft, RecipeId, now_utc};
use recipes_storage::RecipeStorage;

use crate::cache::RecipeListingCache;
use crate::config::AdminUserConfig;

/// Creates the configured admin user, or resets its password if it
/// already exists.
pub async fn bootstrap_admin_user(
    users: &dyn UserStorage,
    admin: &AdminUserConfig,
) -> anyhow::Result<()> {
    let password = admin.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task failed")?
        .map_err(|e| anyhow!("failed to hash admin password: {e}"))?;

    let user = users
        .upsert(&User::new(admin.username.clone(), hash))
        .await
        .context("failed to store admin user")?;
    tracing::info!(username = %user.username, "admin user ready");
    Ok(())
}

/// Imports the recipe payloads in `path` when the store holds no recipes.
/// Returns how many were imported.
pub async fn import_seed(
    storage: &dyn RecipeStorage,
    listing: &RecipeListingCache,
    path: &Path,
) -> anyhow::Result<usize> {
    let existing = storage.count().await.context("failed to count recipes")?;
    if existing > 0 {
        tracing::info!(existing, "recipe store not empty, skipping seed import");
        return Ok(0);
    }

    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let drafts: Vec<RecipeDraft> = serde_json::from_slice(&raw)
        .with_context(|| format!("invalid seed file {}", path.display()))?;

    for (index, draft) in drafts.iter().enumerate() {
        draft
            .validate()
            .with_context(|| format!("seed recipe #{index} is invalid"))?;
    }

    let imported = drafts.len();
    for draft in drafts {
        let recipe = draft.into_recipe(RecipeId::generate(), now_utc());
        storage
            .insert(&recipe)
            .await
            .with_context(|| format!("failed to import seed recipe {}", recipe.name))?;
    }
    listing.invalidate().await?;

    tracing::info!(imported, path = %path.display(), "seed recipes imported");
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;
    use recipes_auth::password::verify_password;
    use recipes_auth::storage::InMemoryUserStorage;
    use recipes_db_memory::InMemoryStorage;
    use std::io::Write;

    fn admin(password: &str) -> AdminUserConfig {
        AdminUserConfig {
            username: "admin".into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_admin_user_upserted() {
        let users = InMemoryUserStorage::new();
        bootstrap_admin_user(&users, &admin("first")).await.unwrap();
        bootstrap_admin_user(&users, &admin("second")).await.unwrap();

        let user = users.find_by_username("admin").await.unwrap().unwrap();
        assert!(verify_password("second", &user.password_hash).unwrap());
        assert!(!verify_password("first", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_seed_imported_only_into_empty_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "Tea", "tags": ["Drink"]}}, {{"name": "Cake", "tags": ["Dessert"]}}]"#
        )
        .unwrap();

        let storage = InMemoryStorage::new();
        let listing = RecipeListingCache::new(CacheBackend::new_local());

        assert_eq!(import_seed(&storage, &listing, file.path()).await.unwrap(), 2);
        assert_eq!(storage.count().await.unwrap(), 2);

        assert_eq!(import_seed(&storage, &listing, file.path()).await.unwrap(), 0);
        assert_eq!(storage.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_seed_imports_nothing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "Tea"}}, {{"name": "  "}}]"#).unwrap();

        let storage = InMemoryStorage::new();
        let listing = RecipeListingCache::new(CacheBackend::new_local());

        assert!(import_seed(&storage, &listing, file.path()).await.is_err());
        assert_eq!(storage.count().await.unwrap(), 0);
    }
}
