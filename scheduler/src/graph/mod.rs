//! Graph store sessions.
//!
//! The hosting process owns the pool lifecycle; the run engine only opens
//! sessions scoped to a space and releases them when a task is done.

use async_trait::async_trait;

mod gateway;

pub use gateway::{GatewayPool, GatewaySettings};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("graph pool is not initialized")]
    NotInitialized,

    #[error("graph gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("graph store rejected statement (code {code}): {message}")]
    Rejected { code: i64, message: String },
}

#[async_trait]
pub trait GraphPool: Send + Sync {
    /// Opens a session with `space` already selected.
    async fn session(&self, space: &str) -> Result<Box<dyn GraphSession>, GraphError>;
}

#[async_trait]
pub trait GraphSession: Send {
    async fn execute(&mut self, statement: &str) -> Result<(), GraphError>;

    /// Returns the session to the store. Errors are logged, not reported.
    async fn release(&mut self);
}

/// Backtick-quoted `USE` statement for a space.
pub fn use_space(space: &str) -> String {
    format!("USE `{space}`;")
}
