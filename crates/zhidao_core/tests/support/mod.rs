//! In-memory doubles for the learning service and the user store.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use zhidao_core::{
    ActivityAction, Content, ContentCollection, ContentKind, CreatedGoal,
    CrossDisciplinaryRecommendation, DeepQuestion, Exploration, GoalPriority, LearningActivity,
    LearningCoordinator, LearningGoal, LearningPath, LearningService, PortResult, RemoteError,
    RemoteResult, User, UserStore,
};

pub const SERVER_EXPLORATION: u8 = 65;

/// A learning service that either answers with canned data or fails every call.
pub struct FakeService {
    online: AtomicBool,
    calls: Mutex<Vec<String>>,
    held: Mutex<Option<(String, Arc<Notify>, Arc<Notify>)>>,
}

impl FakeService {
    pub fn online() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
            held: Mutex::new(None),
        })
    }

    pub fn offline() -> Arc<Self> {
        let service = Self::online();
        service.set_online(false);
        service
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    /// Makes the next call logged as `call` wait. Returns (entered, release).
    pub fn hold(&self, call: &str) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.held.lock().unwrap() = Some((call.to_string(), entered.clone(), release.clone()));
        (entered, release)
    }

    pub fn hold_content(&self, topic: &str) -> (Arc<Notify>, Arc<Notify>) {
        self.hold(&format!("fetch_content:{topic}"))
    }

    async fn wait_if_held(&self, call: &str) {
        let held = {
            let mut held = self.held.lock().unwrap();
            match held.as_ref() {
                Some((c, _, _)) if c == call => held.take(),
                _ => None,
            }
        };
        if let Some((_, entered, release)) = held {
            entered.notify_one();
            release.notified().await;
        }
    }

    fn record(&self, call: String) -> RemoteResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::TransportFailure("offline".to_string()))
        }
    }
}

pub fn server_path(topic: &str) -> LearningPath {
    LearningPath {
        foundational: vec![format!("服务器路径: {topic}")],
        intermediate: vec!["进阶".to_string()],
        advanced: vec!["高阶".to_string()],
        projects: vec!["项目".to_string()],
    }
}

pub fn server_content(topic: &str) -> ContentCollection {
    ContentCollection {
        topic: topic.to_string(),
        content: vec![Content {
            id: "srv-1".to_string(),
            title: format!("服务器内容 - {topic}"),
            summary: "来自服务器".to_string(),
            authors: vec!["作者".to_string()],
            year: None,
            kind: ContentKind::UserGenerated,
            tags: Vec::new(),
            relevance_score: 0.5,
        }],
        fetched_at: Utc::now(),
    }
}

#[async_trait]
impl LearningService for FakeService {
    async fn create_goal(
        &self,
        _user_id: &str,
        goal: &str,
        _timeframe: &str,
        _priority: GoalPriority,
    ) -> RemoteResult<CreatedGoal> {
        self.record(format!("create_goal:{goal}"))?;
        Ok(CreatedGoal {
            goal_id: format!("goal-{}", self.calls().len()),
            learning_path: server_path(goal),
        })
    }

    async fn fetch_content(&self, topic: &str) -> RemoteResult<ContentCollection> {
        self.wait_if_held(&format!("fetch_content:{topic}")).await;
        self.record(format!("fetch_content:{topic}"))?;
        Ok(server_content(topic))
    }

    async fn fetch_deep_questions(&self, topic: &str) -> RemoteResult<Vec<DeepQuestion>> {
        self.record(format!("fetch_deep_questions:{topic}"))?;
        Ok(vec![DeepQuestion {
            id: "q-1".to_string(),
            question: format!("{topic}为什么重要？"),
            category: "原理".to_string(),
            difficulty: 2,
        }])
    }

    async fn fetch_cross_disciplinary_recommendations(
        &self,
        _user_id: &str,
        topic: &str,
    ) -> RemoteResult<Exploration> {
        self.wait_if_held(&format!("fetch_recommendations:{topic}")).await;
        self.record(format!("fetch_recommendations:{topic}"))?;
        Ok(Exploration {
            recommendations: vec![CrossDisciplinaryRecommendation {
                id: "r-1".to_string(),
                area: "数学".to_string(),
                connection: format!("{topic}依赖数学"),
                value_proposition: "更扎实的基础".to_string(),
                exploration_difficulty: 4,
            }],
            exploration_percentage: SERVER_EXPLORATION,
        })
    }

    async fn fetch_learning_path(&self, _user_id: &str, topic: &str) -> RemoteResult<LearningPath> {
        self.wait_if_held(&format!("fetch_learning_path:{topic}")).await;
        self.record(format!("fetch_learning_path:{topic}"))?;
        Ok(server_path(topic))
    }

    async fn record_progress(
        &self,
        _user_id: &str,
        content_id: &str,
        action: ActivityAction,
        _duration: Option<Duration>,
    ) -> RemoteResult<()> {
        self.record(format!("record_progress:{content_id}:{action}"))
    }

    async fn record_activity(&self, _user_id: &str, activity: &LearningActivity) -> RemoteResult<()> {
        self.record(format!(
            "record_activity:{}:{}",
            activity.content_id, activity.action
        ))
    }
}

/// A user store backed by a single in-memory slot.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<User>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_user(user: User) -> Arc<Self> {
        let store = Self::default();
        *store.slot.lock().unwrap() = Some(user);
        Arc::new(store)
    }

    pub fn saved(&self) -> Option<User> {
        self.slot.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn load_user(&self) -> PortResult<Option<User>> {
        Ok(self.saved())
    }

    async fn save_user(&self, user: &User) -> PortResult<()> {
        *self.slot.lock().unwrap() = Some(user.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn coordinator(remote: Arc<FakeService>, store: Arc<MemoryStore>) -> LearningCoordinator {
    LearningCoordinator::new(remote, store)
}

pub fn goal(text: &str, progress: u8, days_ago: i64) -> LearningGoal {
    LearningGoal {
        id: format!("goal-{text}"),
        goal: text.to_string(),
        timeframe: "1月".to_string(),
        priority: GoalPriority::Medium,
        created_at: Utc::now() - chrono::Duration::days(days_ago),
        progress,
        related_topics: Vec::new(),
    }
}

pub fn user_with_goals(goals: Vec<LearningGoal>) -> User {
    let mut user = User::new("user-1", "用户 USER", None);
    user.learning_goals = goals;
    user
}
