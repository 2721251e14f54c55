//! services/client/src/adapters/store.rs
//!
//! This module contains the persistence adapter, the concrete implementation
//! of the `UserStore` port from the `core` crate. The user aggregate is kept as
//! one JSON document in a SQLite key-value table, managed with `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use zhidao_core::domain::{
    ActivityAction, GoalPriority, LearningActivity, LearningGoal, User, MAX_PROGRESS,
};
use zhidao_core::ports::{PortError, PortResult, UserStore};

/// The fixed key the active user is stored under.
pub const USER_KEY: &str = "currentUser";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A SQLite-backed adapter that implements the `UserStore` port.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Creates a new `SqliteUserStore`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Stored Records
//=========================================================================================
// The JSON shape below is the on-disk schema. Field names are fixed; timestamps are
// RFC 3339 and durations are fractional seconds. Percentages are read wide and clamped
// so one out-of-range value cannot make the whole user unreadable.
//=========================================================================================

fn clamp_percentage(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_PROGRESS)) as u8
}

#[derive(FromRow)]
struct UserStateRow {
    payload: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: String,
    name: String,
    email: Option<String>,
    learning_goals: Vec<LearningGoalRecord>,
    learning_history: Vec<LearningActivityRecord>,
    explored_topics: BTreeMap<String, i64>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PriorityRecord {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LearningGoalRecord {
    id: String,
    goal: String,
    timeframe: String,
    priority: PriorityRecord,
    created_at: DateTime<Utc>,
    progress: i64,
    related_topics: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ActionRecord {
    Viewed,
    Completed,
    Saved,
    Shared,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LearningActivityRecord {
    id: String,
    content_id: String,
    action: ActionRecord,
    duration: Option<f64>,
    timestamp: DateTime<Utc>,
}

impl UserRecord {
    fn from_domain(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            learning_goals: user
                .learning_goals
                .iter()
                .map(LearningGoalRecord::from_domain)
                .collect(),
            learning_history: user
                .learning_history
                .iter()
                .map(LearningActivityRecord::from_domain)
                .collect(),
            explored_topics: user
                .explored_topics
                .iter()
                .map(|(topic, percentage)| (topic.clone(), i64::from(*percentage)))
                .collect(),
        }
    }

    fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            learning_goals: self
                .learning_goals
                .into_iter()
                .map(LearningGoalRecord::to_domain)
                .collect(),
            learning_history: self
                .learning_history
                .into_iter()
                .map(LearningActivityRecord::to_domain)
                .collect(),
            explored_topics: self
                .explored_topics
                .into_iter()
                .map(|(topic, percentage)| (topic, clamp_percentage(percentage)))
                .collect(),
        }
    }
}

impl LearningGoalRecord {
    fn from_domain(goal: &LearningGoal) -> Self {
        Self {
            id: goal.id.clone(),
            goal: goal.goal.clone(),
            timeframe: goal.timeframe.clone(),
            priority: match goal.priority {
                GoalPriority::Low => PriorityRecord::Low,
                GoalPriority::Medium => PriorityRecord::Medium,
                GoalPriority::High => PriorityRecord::High,
            },
            created_at: goal.created_at,
            progress: i64::from(goal.progress),
            related_topics: goal.related_topics.clone(),
        }
    }

    fn to_domain(self) -> LearningGoal {
        LearningGoal {
            id: self.id,
            goal: self.goal,
            timeframe: self.timeframe,
            priority: match self.priority {
                PriorityRecord::Low => GoalPriority::Low,
                PriorityRecord::Medium => GoalPriority::Medium,
                PriorityRecord::High => GoalPriority::High,
            },
            created_at: self.created_at,
            progress: clamp_percentage(self.progress),
            related_topics: self.related_topics,
        }
    }
}

impl LearningActivityRecord {
    fn from_domain(activity: &LearningActivity) -> Self {
        Self {
            id: activity.id.clone(),
            content_id: activity.content_id.clone(),
            action: match activity.action {
                ActivityAction::Viewed => ActionRecord::Viewed,
                ActivityAction::Completed => ActionRecord::Completed,
                ActivityAction::Saved => ActionRecord::Saved,
                ActivityAction::Shared => ActionRecord::Shared,
            },
            duration: activity.duration.map(|d| d.as_secs_f64()),
            timestamp: activity.timestamp,
        }
    }

    fn to_domain(self) -> LearningActivity {
        LearningActivity {
            id: self.id,
            content_id: self.content_id,
            action: match self.action {
                ActionRecord::Viewed => ActivityAction::Viewed,
                ActionRecord::Completed => ActivityAction::Completed,
                ActionRecord::Saved => ActivityAction::Saved,
                ActionRecord::Shared => ActivityAction::Shared,
            },
            // Negative or non-finite durations are dropped rather than failing the whole load.
            duration: self.duration.and_then(|s| Duration::try_from_secs_f64(s).ok()),
            timestamp: self.timestamp,
        }
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn load_user(&self) -> PortResult<Option<User>> {
        let row = sqlx::query_as::<_, UserStateRow>("SELECT payload FROM user_state WHERE key = ?1")
            .bind(USER_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Storage(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        match serde_json::from_str::<UserRecord>(&row.payload) {
            Ok(record) => Ok(Some(record.to_domain())),
            Err(e) => {
                warn!(error = %e, "Saved user could not be decoded; treating as absent");
                Ok(None)
            }
        }
    }

    async fn save_user(&self, user: &User) -> PortResult<()> {
        let payload = serde_json::to_string(&UserRecord::from_domain(user))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query(
            "INSERT INTO user_state (key, payload, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
        )
        .bind(USER_KEY)
        .bind(&payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Storage(e.to_string()))?;

        debug!(user_id = %user.id, bytes = payload.len(), "Saved user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteUserStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteUserStore::new(pool);
        store.run_migrations().await.unwrap();
        store
    }

    fn populated_user() -> User {
        let mut user = User::new("user-1", "用户 USER", Some("learner@example.com".to_string()));
        user.learning_goals.push(LearningGoal {
            id: "goal-1".to_string(),
            goal: "宏观经济学".to_string(),
            timeframe: "2月".to_string(),
            priority: GoalPriority::High,
            created_at: Utc::now(),
            progress: 42,
            related_topics: vec!["GDP".to_string(), "通货膨胀".to_string()],
        });
        user.learning_history.push(LearningActivity {
            id: "activity-1".to_string(),
            content_id: "content-1".to_string(),
            action: ActivityAction::Completed,
            duration: Some(Duration::from_millis(12_500)),
            timestamp: Utc::now(),
        });
        user.learning_history.push(LearningActivity {
            id: "activity-2".to_string(),
            content_id: "content-2".to_string(),
            action: ActivityAction::Shared,
            duration: None,
            timestamp: Utc::now(),
        });
        user.explored_topics.insert("宏观经济学".to_string(), 40);
        user.explored_topics.insert("量子计算入门".to_string(), 100);
        user
    }

    #[tokio::test]
    async fn load_without_saved_state_is_none() {
        let store = store().await;
        assert!(store.load_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = store().await;
        let user = populated_user();

        store.save_user(&user).await.unwrap();
        assert_eq!(store.load_user().await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn empty_user_round_trips() {
        let store = store().await;
        let user = User::new("user-2", "用户 2", None);

        store.save_user(&user).await.unwrap();
        assert_eq!(store.load_user().await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn save_overwrites_previous_user() {
        let store = store().await;
        store.save_user(&populated_user()).await.unwrap();
        let replacement = User::new("user-3", "用户 3", None);

        store.save_user(&replacement).await.unwrap();

        assert_eq!(store.load_user().await.unwrap(), Some(replacement));
        let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_state")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(rows.0, 1);
    }

    #[tokio::test]
    async fn undecodable_payload_is_treated_as_absent() {
        let store = store().await;
        sqlx::query("INSERT INTO user_state (key, payload, updated_at) VALUES (?1, ?2, ?3)")
            .bind(USER_KEY)
            .bind(r#"{"id": 7}"#)
            .bind(Utc::now())
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(store.load_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn out_of_range_percentages_are_clamped_on_load() {
        let store = store().await;
        let mut record = serde_json::to_value(UserRecord::from_domain(&populated_user())).unwrap();
        record["learningGoals"][0]["progress"] = serde_json::json!(300);
        record["exploredTopics"]["宏观经济学"] = serde_json::json!(-1);
        record["exploredTopics"]["量子计算入门"] = serde_json::json!(250);
        sqlx::query("INSERT INTO user_state (key, payload, updated_at) VALUES (?1, ?2, ?3)")
            .bind(USER_KEY)
            .bind(record.to_string())
            .bind(Utc::now())
            .execute(&store.pool)
            .await
            .unwrap();

        let user = store.load_user().await.unwrap().expect("saved user");
        assert_eq!(user.id, "user-1");
        assert_eq!(user.learning_goals[0].progress, 100);
        assert_eq!(user.explored_topics["宏观经济学"], 0);
        assert_eq!(user.explored_topics["量子计算入门"], 100);
        assert_eq!(user.learning_history.len(), 2);
    }

    #[test]
    fn stored_json_uses_camel_case_and_iso_timestamps() {
        let json = serde_json::to_value(UserRecord::from_domain(&populated_user())).unwrap();
        let goal = &json["learningGoals"][0];
        assert_eq!(goal["priority"], "high");
        assert!(goal["createdAt"].as_str().unwrap().contains('T'));
        assert_eq!(json["learningHistory"][0]["contentId"], "content-1");
        assert_eq!(json["learningHistory"][0]["duration"], 12.5);
        assert_eq!(json["exploredTopics"]["宏观经济学"], 40);
    }
}
