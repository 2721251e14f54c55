//! crates/zhidao_core/src/domain.rs
//!
//! Defines the pure, core data structures for the learning client.
//! These structs are independent of any wire or storage format; the adapters
//! own their own record types and convert into these.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound of a goal's progress and of an exploration percentage.
pub const MAX_PROGRESS: u8 = 100;

//=========================================================================================
// User Aggregate
//=========================================================================================

/// The single active user of a session. Persisted as a whole after every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub learning_goals: Vec<LearningGoal>,
    pub learning_history: Vec<LearningActivity>,
    /// Topic name to exploration percentage (0-100).
    pub explored_topics: BTreeMap<String, u8>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email,
            learning_goals: Vec::new(),
            learning_history: Vec::new(),
            explored_topics: BTreeMap::new(),
        }
    }

    /// The first goal whose text equals `topic`.
    ///
    /// Goal text acts as a secondary key here; nothing enforces that it is unique.
    pub fn goal_for_topic(&self, topic: &str) -> Option<&LearningGoal> {
        self.learning_goals.iter().find(|g| g.goal == topic)
    }

    pub fn goal_for_topic_mut(&mut self, topic: &str) -> Option<&mut LearningGoal> {
        self.learning_goals.iter_mut().find(|g| g.goal == topic)
    }

    /// The goal with the latest `created_at`, if any.
    pub fn most_recent_goal(&self) -> Option<&LearningGoal> {
        self.learning_goals.iter().max_by_key(|g| g.created_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalPriority {
    Low,
    Medium,
    High,
}

impl GoalPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalPriority::Low => "low",
            GoalPriority::Medium => "medium",
            GoalPriority::High => "high",
        }
    }
}

/// A user-declared learning objective.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningGoal {
    pub id: String,
    pub goal: String,
    pub timeframe: String,
    pub priority: GoalPriority,
    pub created_at: DateTime<Utc>,
    /// 0-100, never decreases under normal flow.
    pub progress: u8,
    pub related_topics: Vec<String>,
}

impl LearningGoal {
    /// Raises progress by `increment`, saturating at [`MAX_PROGRESS`]. Returns the new value.
    pub fn advance(&mut self, increment: u8) -> u8 {
        self.progress = self.progress.saturating_add(increment).min(MAX_PROGRESS);
        self.progress
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityAction {
    Viewed,
    Completed,
    Saved,
    Shared,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Viewed => "viewed",
            ActivityAction::Completed => "completed",
            ActivityAction::Saved => "saved",
            ActivityAction::Shared => "shared",
        }
    }

    /// How much an activity of this kind advances the goal for the current topic.
    pub fn progress_increment(&self) -> Option<u8> {
        match self {
            ActivityAction::Completed => Some(10),
            ActivityAction::Viewed => Some(3),
            ActivityAction::Saved | ActivityAction::Shared => None,
        }
    }
}

/// An append-only record of the user interacting with a piece of content.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningActivity {
    pub id: String,
    pub content_id: String,
    pub action: ActivityAction,
    pub duration: Option<Duration>,
    pub timestamp: DateTime<Utc>,
}

//=========================================================================================
// Topic-scoped Data (fetched, never persisted)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Academic,
    Synthetic,
    UserGenerated,
    News,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Academic => "academic",
            ContentKind::Synthetic => "synthetic",
            ContentKind::UserGenerated => "userGenerated",
            ContentKind::News => "news",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub kind: ContentKind,
    pub tags: Vec<String>,
    /// 0.0-1.0
    pub relevance_score: f64,
}

/// Content fetched for one topic. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentCollection {
    pub topic: String,
    pub content: Vec<Content>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeepQuestion {
    pub id: String,
    pub question: String,
    pub category: String,
    /// 1-5
    pub difficulty: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossDisciplinaryRecommendation {
    pub id: String,
    pub area: String,
    pub connection: String,
    pub value_proposition: String,
    /// 1-5
    pub exploration_difficulty: u8,
}

/// Recommendations for a topic together with how much of it the user has explored.
#[derive(Debug, Clone, PartialEq)]
pub struct Exploration {
    pub recommendations: Vec<CrossDisciplinaryRecommendation>,
    pub exploration_percentage: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearningPath {
    pub foundational: Vec<String>,
    pub intermediate: Vec<String>,
    pub advanced: Vec<String>,
    pub projects: Vec<String>,
}

/// What the learning service hands back when a goal is created.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedGoal {
    pub goal_id: String,
    pub learning_path: LearningPath,
}

//=========================================================================================
// String Conversions
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} '{value}'")]
pub struct ParseValueError {
    kind: &'static str,
    value: String,
}

impl ParseValueError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl FromStr for GoalPriority {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(GoalPriority::Low),
            "medium" => Ok(GoalPriority::Medium),
            "high" => Ok(GoalPriority::High),
            other => Err(ParseValueError::new("goal priority", other)),
        }
    }
}

impl FromStr for ActivityAction {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewed" => Ok(ActivityAction::Viewed),
            "completed" => Ok(ActivityAction::Completed),
            "saved" => Ok(ActivityAction::Saved),
            "shared" => Ok(ActivityAction::Shared),
            other => Err(ParseValueError::new("activity action", other)),
        }
    }
}

impl FromStr for ContentKind {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "academic" => Ok(ContentKind::Academic),
            "synthetic" => Ok(ContentKind::Synthetic),
            "userGenerated" => Ok(ContentKind::UserGenerated),
            "news" => Ok(ContentKind::News),
            other => Err(ParseValueError::new("content type", other)),
        }
    }
}

impl fmt::Display for GoalPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
