use thiserror::Error;

/// Errors produced while parsing or validating recipe data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid recipe id: {0}")]
    InvalidId(String),

    #[error("Invalid recipe: {message}")]
    InvalidRecipe { message: String },
}

impl CoreError {
    /// Create a new InvalidId error
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId(id.into())
    }

    /// Create a new InvalidRecipe error
    pub fn invalid_recipe(message: impl Into<String>) -> Self {
        Self::InvalidRecipe {
            message: message.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
