//! Core domain types for the recipes server.
//!
//! This crate owns the [`Recipe`] document, the client-supplied
//! [`RecipeDraft`] used for create and update, and the [`RecipeId`]
//! identifier. Nothing here touches storage or HTTP.

pub mod error;
pub mod id;
pub mod recipe;

pub use error::{CoreError, CoreResult};
pub use id::RecipeId;
pub use recipe::{Recipe, RecipeDraft, filter_by_tag};

/// Current UTC time, truncated to whole microseconds.
///
/// Timestamps round-trip through Postgres `timestamptz`, which keeps
/// microsecond precision, so all of them are created at that precision.
pub fn now_utc() -> time::OffsetDateTime {
    let now = time::OffsetDateTime::now_utc();
    let micros = now.microsecond();
    now.replace_microsecond(micros).unwrap_or(now)
}
