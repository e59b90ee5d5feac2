//! Client-side reconciliation for group chat over a poll-only shared
//! object store.

pub mod audio;
pub mod auth;
pub mod cache;
pub mod client;
pub mod groups;
pub mod object;
pub mod profiles;
pub mod schema;
pub mod session;
pub mod store;
pub mod transcribe;

use anyhow::anyhow;
use serde_json::Value;

pub use client::{Client, ClientEvent};
pub use session::Session;
pub use store::{LocalStore, ObjectStore, StoreError};

/// Channel every client watches for group creation records.
pub const DEFAULT_LOBBY: &str = "lobby";

pub trait GetField {
    fn get_str_field(&self, field: &str) -> anyhow::Result<String>;
    fn get_obj_field(&self, field: &str) -> anyhow::Result<&Value>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> anyhow::Result<String> {
        Ok(
            self.get(field)
            .ok_or(anyhow!("expected {field} in {self}"))?
            .as_str()
            .ok_or(anyhow!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }

    fn get_obj_field(&self, field: &str) -> anyhow::Result<&Value> {
        self.get(field)
        .ok_or(anyhow!("expected {field} in {self}"))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The operation needs a signed-in session and none is present.
    #[error("not signed in")]
    Unauthenticated,
    /// Rejected before any store call was issued.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A mutation reached the store and the store refused it. No local
    /// state was changed.
    #[error("operation failed: {0}")]
    OperationFailed(#[source] StoreError),
    /// A read against the store failed. The previous snapshot, if any,
    /// is still being served.
    #[error("refresh failed: {0}")]
    RefreshFailed(#[source] StoreError),
}

impl AppError {
    pub fn operation(err: impl Into<anyhow::Error>) -> Self {
        Self::OperationFailed(StoreError(err.into()))
    }

    pub fn refresh(err: impl Into<anyhow::Error>) -> Self {
        Self::RefreshFailed(StoreError(err.into()))
    }
}
