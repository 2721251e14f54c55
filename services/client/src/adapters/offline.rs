//! services/client/src/adapters/offline.rs
//!
//! An implementation of the `LearningService` port that never touches the
//! network. Every answer is synthesized from the core fallback data, which makes
//! the client usable without a running learning service.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;
use zhidao_core::domain::{
    ActivityAction, ContentCollection, CreatedGoal, DeepQuestion, Exploration, GoalPriority,
    LearningActivity, LearningPath,
};
use zhidao_core::fallback;
use zhidao_core::ports::{LearningService, RemoteResult};

#[derive(Clone, Debug, Default)]
pub struct OfflineLearningService;

impl OfflineLearningService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LearningService for OfflineLearningService {
    async fn create_goal(
        &self,
        _user_id: &str,
        goal: &str,
        _timeframe: &str,
        _priority: GoalPriority,
    ) -> RemoteResult<CreatedGoal> {
        Ok(CreatedGoal {
            goal_id: Uuid::new_v4().to_string(),
            learning_path: fallback::learning_path(goal),
        })
    }

    async fn fetch_content(&self, topic: &str) -> RemoteResult<ContentCollection> {
        Ok(ContentCollection {
            topic: topic.to_string(),
            content: fallback::default_content(topic),
            fetched_at: Utc::now(),
        })
    }

    async fn fetch_deep_questions(&self, topic: &str) -> RemoteResult<Vec<DeepQuestion>> {
        Ok(fallback::deep_questions(topic))
    }

    async fn fetch_cross_disciplinary_recommendations(
        &self,
        _user_id: &str,
        topic: &str,
    ) -> RemoteResult<Exploration> {
        Ok(fallback::exploration(topic))
    }

    async fn fetch_learning_path(&self, _user_id: &str, topic: &str) -> RemoteResult<LearningPath> {
        Ok(fallback::learning_path(topic))
    }

    async fn record_progress(
        &self,
        _user_id: &str,
        content_id: &str,
        action: ActivityAction,
        _duration: Option<Duration>,
    ) -> RemoteResult<()> {
        debug!(content_id, %action, "Progress accepted offline");
        Ok(())
    }

    async fn record_activity(&self, _user_id: &str, activity: &LearningActivity) -> RemoteResult<()> {
        debug!(content_id = %activity.content_id, action = %activity.action, "Activity accepted offline");
        Ok(())
    }
}
