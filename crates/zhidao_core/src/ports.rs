//! crates/zhidao_core/src/ports.rs
//!
//! Defines the service contracts (traits) the coordinator depends on.
//! These traits form the boundary of the hexagonal architecture, so the core
//! never knows whether it talks to HTTP, SQLite, or a test double.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{
    ActivityAction, ContentCollection, CreatedGoal, DeepQuestion, Exploration, GoalPriority,
    LearningActivity, LearningPath, User,
};

//=========================================================================================
// Error and Result Types
//=========================================================================================

/// Failure of a single call to the remote learning service.
///
/// The coordinator never branches on the variant; the display string is what
/// ends up as the user-visible error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Invalid URL: {0}")]
    InvalidRequest(String),
    #[error("Failed to encode request data: {0}")]
    EncodingFailed(String),
    #[error("Network request failed: {0}")]
    TransportFailure(String),
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
    #[error("Server error with status code: {0}")]
    ServerError(u16),
    #[error("No data received from server")]
    NoData,
    #[error("Failed to decode response data: {0}")]
    DecodingFailed(String),
}

/// A convenience type alias for `Result<T, RemoteError>`.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A generic error type for local port operations (persistence).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote learning service. Every call is one-shot: no retries, no local side effects.
#[async_trait]
pub trait LearningService: Send + Sync {
    async fn create_goal(
        &self,
        user_id: &str,
        goal: &str,
        timeframe: &str,
        priority: GoalPriority,
    ) -> RemoteResult<CreatedGoal>;

    async fn fetch_content(&self, topic: &str) -> RemoteResult<ContentCollection>;

    async fn fetch_deep_questions(&self, topic: &str) -> RemoteResult<Vec<DeepQuestion>>;

    async fn fetch_cross_disciplinary_recommendations(
        &self,
        user_id: &str,
        topic: &str,
    ) -> RemoteResult<Exploration>;

    async fn fetch_learning_path(&self, user_id: &str, topic: &str) -> RemoteResult<LearningPath>;

    async fn record_progress(
        &self,
        user_id: &str,
        content_id: &str,
        action: ActivityAction,
        duration: Option<Duration>,
    ) -> RemoteResult<()>;

    async fn record_activity(&self, user_id: &str, activity: &LearningActivity) -> RemoteResult<()>;
}

/// Durable slot holding the single user aggregate.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Loads the saved user. A payload that cannot be decoded counts as "nothing saved".
    async fn load_user(&self) -> PortResult<Option<User>>;

    /// Overwrites the saved user. A later load never observes a partial write.
    async fn save_user(&self, user: &User) -> PortResult<()>;
}
