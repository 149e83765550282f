//! `RecipeStorage` over a JSONB table.

use async_trait::async_trait;
use serde_json::{Value, json};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use tracing::{debug, instrument};

use recipes_core::{Recipe, RecipeDraft, RecipeId};
use recipes_storage::{RecipeStorage, StorageError, StorageResult};

use crate::config::PostgresConfig;
use crate::error::{is_unique_violation, sqlx_to_storage};
use crate::migrations;

/// PostgreSQL-backed recipe storage.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates the pool and, if configured, applies migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or a migration
    /// fails.
    pub async fn new(config: PostgresConfig) -> StorageResult<Self> {
        let pool = config.connect().await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Wraps an existing pool. Migrations are not run.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode(resource: Value) -> StorageResult<Recipe> {
    serde_json::from_value(resource).map_err(StorageError::from)
}

#[async_trait]
impl RecipeStorage for PostgresStorage {
    #[instrument(skip(self, recipe), fields(id = %recipe.id))]
    async fn insert(&self, recipe: &Recipe) -> StorageResult<()> {
        let resource = serde_json::to_value(recipe)?;

        query("INSERT INTO recipe (id, published_at, resource) VALUES ($1, $2, $3)")
            .bind(recipe.id.as_uuid())
            .bind(recipe.published_at)
            .bind(&resource)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StorageError::already_exists(recipe.id.to_string())
                } else {
                    sqlx_to_storage(e)
                }
            })?;

        debug!("recipe inserted");
        Ok(())
    }

    async fn find_by_id(&self, id: &RecipeId) -> StorageResult<Option<Recipe>> {
        let row: Option<(Value,)> = query_as("SELECT resource FROM recipe WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_to_storage)?;

        row.map(|(resource,)| decode(resource)).transpose()
    }

    async fn find_all(&self) -> StorageResult<Vec<Recipe>> {
        let rows: Vec<(Value,)> =
            query_as("SELECT resource FROM recipe ORDER BY published_at, id")
                .fetch_all(&self.pool)
                .await
                .map_err(sqlx_to_storage)?;

        rows.into_iter().map(|(resource,)| decode(resource)).collect()
    }

    #[instrument(skip(self, draft), fields(id = %id))]
    async fn update_fields(&self, id: &RecipeId, draft: &RecipeDraft) -> StorageResult<Recipe> {
        // Only the mutable keys are merged; id and publishedAt stay as stored.
        let patch = json!({
            "name": draft.name,
            "tags": draft.tags,
            "ingredients": draft.ingredients,
            "instructions": draft.instructions,
        });

        let row: Option<(Value,)> = query_as(
            "UPDATE recipe SET resource = resource || $2 WHERE id = $1 RETURNING resource",
        )
        .bind(id.as_uuid())
        .bind(&patch)
        .fetch_optional(&self.pool)
        .await
        .map_err(sqlx_to_storage)?;

        match row {
            Some((resource,)) => decode(resource),
            None => Err(StorageError::not_found(id.to_string())),
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &RecipeId) -> StorageResult<()> {
        let result = query("DELETE FROM recipe WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(sqlx_to_storage)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(id.to_string()));
        }
        Ok(())
    }

    async fn count(&self) -> StorageResult<u64> {
        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM recipe")
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_to_storage)?;
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> StorageResult<()> {
        query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(sqlx_to_storage)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
