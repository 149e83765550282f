//! HTTP server for the recipes service.
//!
//! Wires the recipe store, the listing cache and the session manager into
//! an axum router. Listings are served cache-aside; recipe writes require
//! an active session and invalidate the cached listing once they succeed.

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod recipes;
pub mod server;

pub use cache::{CacheBackend, CacheError, CacheLookup, ListingError, RecipeListingCache};
pub use config::AppConfig;
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, RecipesServer, ServerBuilder, build_app, build_router, build_state};
