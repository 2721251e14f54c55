//! crates/zhidao_core/src/coordinator.rs
//!
//! The learning state coordinator. It owns the active user and the topic
//! session, sequences calls to the learning service, substitutes fallback data
//! where a failed call would leave the session empty, and persists the user
//! after every mutation.
//!
//! All state lives behind one lock that is never held across a call to the
//! learning service. Completions re-take the lock and apply their result only
//! if the topic they were issued for is still the current one.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    ActivityAction, ContentCollection, CrossDisciplinaryRecommendation, DeepQuestion,
    GoalPriority, LearningActivity, LearningGoal, LearningPath, User, MAX_PROGRESS,
};
use crate::fallback;
use crate::ports::{LearningService, UserStore};

/// Progress added by [`LearningCoordinator::update_progress_for_current_goal`] when the
/// caller has no better figure.
pub const DEFAULT_PROGRESS_INCREMENT: u8 = 5;

/// Recorded when content is requested while no topic is selected.
pub const EMPTY_TOPIC_MESSAGE: &str = "当前主题为空，无法获取内容";

const SAMPLE_GOALS: [(&str, &str, GoalPriority, u8); 2] = [
    ("人工智能基础", "3月", GoalPriority::Medium, 15),
    ("中国古代哲学", "6月", GoalPriority::Low, 30),
];

//=========================================================================================
// Session State
//=========================================================================================

/// Everything fetched for the current topic. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicSession {
    pub topic: String,
    /// Bumped every time the topic changes; completions carry the value they were issued under.
    pub generation: u64,
    pub content: Option<ContentCollection>,
    pub learning_path: Option<LearningPath>,
    pub questions: Vec<DeepQuestion>,
    pub recommendations: Vec<CrossDisciplinaryRecommendation>,
    pub exploration_percentage: u8,
}

impl TopicSession {
    fn begin(&mut self, topic: &str) {
        self.topic = topic.to_string();
        self.generation += 1;
        self.content = None;
        self.learning_path = None;
        self.questions.clear();
        self.recommendations.clear();
        self.exploration_percentage = 0;
    }

    fn ticket(&self) -> Option<Ticket> {
        if self.topic.trim().is_empty() {
            return None;
        }
        Some(Ticket {
            topic: self.topic.clone(),
            generation: self.generation,
        })
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.generation == ticket.generation
    }
}

/// The topic a request was issued for.
#[derive(Debug, Clone)]
struct Ticket {
    topic: String,
    generation: u64,
}

/// A consistent view of the coordinator, as handed to consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearningState {
    pub user: Option<User>,
    pub session: TopicSession,
    pub is_loading: bool,
    /// The most recent failure. Shared by every operation; later ones overwrite it.
    pub error: Option<String>,
    /// Loading requests still awaiting a response, stale ones included.
    loads_in_flight: usize,
}

impl LearningState {
    fn start_loading(&mut self) {
        self.loads_in_flight += 1;
        self.is_loading = true;
    }

    fn finish_loading(&mut self) {
        self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
        self.is_loading = self.loads_in_flight > 0;
    }
}

//=========================================================================================
// The Coordinator
//=========================================================================================

pub struct LearningCoordinator {
    remote: Arc<dyn LearningService>,
    store: Arc<dyn UserStore>,
    state: Mutex<LearningState>,
    background: TaskTracker,
}

impl LearningCoordinator {
    /// Creates a coordinator with no active user. Call [`restore`](Self::restore) or
    /// [`create_temporary_user`](Self::create_temporary_user) before issuing intents.
    pub fn new(remote: Arc<dyn LearningService>, store: Arc<dyn UserStore>) -> Self {
        Self {
            remote,
            store,
            state: Mutex::new(LearningState::default()),
            background: TaskTracker::new(),
        }
    }

    pub async fn snapshot(&self) -> LearningState {
        self.state.lock().await.clone()
    }

    /// The first goal whose text equals the current topic.
    pub async fn current_goal(&self) -> Option<LearningGoal> {
        let state = self.state.lock().await;
        state
            .user
            .as_ref()?
            .goal_for_topic(&state.session.topic)
            .cloned()
    }

    /// Waits for every best-effort activity upload spawned so far.
    pub async fn wait_for_background(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }

    async fn persist(&self, user: &User) {
        if let Err(e) = self.store.save_user(user).await {
            error!(user_id = %user.id, error = %e, "Failed to persist user");
        }
    }

    // --- User Lifecycle ---

    /// Loads the saved user, if any, and makes its newest goal the current topic.
    pub async fn restore(&self) -> bool {
        let loaded = match self.store.load_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Failed to load saved user; starting fresh");
                None
            }
        };
        let Some(user) = loaded else {
            return false;
        };

        let mut state = self.state.lock().await;
        if let Some(goal) = user.most_recent_goal() {
            state.session.begin(&goal.goal);
        }
        info!(
            user_id = %user.id,
            goals = user.learning_goals.len(),
            topic = %state.session.topic,
            "Restored saved user"
        );
        state.user = Some(user);
        true
    }

    pub async fn create_temporary_user(&self) {
        let id = Uuid::new_v4().to_string().to_uppercase();
        let name = format!("用户 {}", &id[..4]);
        let user = User::new(id, name, None);

        let mut state = self.state.lock().await;
        self.persist(&user).await;
        info!(user_id = %user.id, "Created temporary user");
        state.user = Some(user);
    }

    /// Adds the two sample goals, each with a few past activities.
    pub async fn seed_sample_goals(&self) {
        let mut state = self.state.lock().await;
        let Some(user) = state.user.as_mut() else {
            return;
        };

        let now = Utc::now();
        for (index, (goal, timeframe, priority, progress)) in SAMPLE_GOALS.iter().enumerate() {
            let index = index as i64;
            user.learning_goals.push(LearningGoal {
                id: Uuid::new_v4().to_string(),
                goal: goal.to_string(),
                timeframe: timeframe.to_string(),
                priority: *priority,
                created_at: now - chrono::Duration::days(1 + 2 * index),
                progress: *progress,
                related_topics: fallback::related_topics(goal),
            });

            for step in 0..3_i64 {
                let action = if step % 2 == 0 {
                    ActivityAction::Viewed
                } else {
                    ActivityAction::Completed
                };
                let content_id = Uuid::new_v4().simple().to_string();
                user.learning_history.push(LearningActivity {
                    id: Uuid::new_v4().to_string(),
                    content_id: format!("sample-{}", &content_id[..8]),
                    action,
                    duration: None,
                    timestamp: now - chrono::Duration::hours(12 * (step + 1) + 24 * index),
                });
            }
        }

        if let Some(user) = state.user.as_ref() {
            info!(goals = user.learning_goals.len(), "Seeded sample goals");
            self.persist(user).await;
        }
    }

    // --- Goals and Topics ---

    /// Asks the service for a path for a new goal. Without an active user this does nothing.
    ///
    /// On success the goal is added with zero progress, the user is persisted, and the
    /// goal becomes the current topic. On failure the user is left untouched and a
    /// fallback path for the goal text is shown instead.
    pub async fn create_goal(&self, goal: &str, timeframe: &str, priority: GoalPriority) {
        let (user_id, generation) = {
            let mut state = self.state.lock().await;
            let Some(user_id) = state.user.as_ref().map(|u| u.id.clone()) else {
                debug!("No active user; goal creation ignored");
                return;
            };
            state.start_loading();
            state.error = None;
            (user_id, state.session.generation)
        };

        info!(goal, timeframe, %priority, "Creating learning goal");
        let result = self
            .remote
            .create_goal(&user_id, goal, timeframe, priority)
            .await;

        {
            let mut state = self.state.lock().await;
            state.finish_loading();

            match result {
                Ok(created) => {
                    let new_goal = LearningGoal {
                        id: created.goal_id,
                        goal: goal.to_string(),
                        timeframe: timeframe.to_string(),
                        priority,
                        created_at: Utc::now(),
                        progress: 0,
                        related_topics: fallback::related_topics(goal),
                    };
                    if let Some(user) = state.user.as_mut() {
                        user.learning_goals.push(new_goal);
                    }
                    if let Some(user) = state.user.as_ref() {
                        self.persist(user).await;
                    }
                    state.session.begin(goal);
                    state.session.learning_path = Some(created.learning_path);
                }
                Err(e) => {
                    warn!(goal, error = %e, "Goal creation failed; using fallback learning path");
                    state.error = Some(e.to_string());
                    if state.session.generation == generation {
                        state.session.learning_path = Some(fallback::learning_path(goal));
                    }
                    return;
                }
            }
        }

        self.fetch_content_for_topic().await;
    }

    /// Clears everything fetched for the old topic, then fetches content for the new one.
    pub async fn switch_topic(&self, topic: &str) {
        self.state.lock().await.session.begin(topic);
        info!(topic, "Switched topic");
        self.fetch_content_for_topic().await;
    }

    // --- Fetching ---

    /// Fetches content for the current topic, then deep questions.
    ///
    /// If the fetch fails and no content is held yet, default content is shown.
    /// Questions are requested whatever the content outcome.
    pub async fn fetch_content_for_topic(&self) {
        let ticket = {
            let mut state = self.state.lock().await;
            let Some(ticket) = state.session.ticket() else {
                state.error = Some(EMPTY_TOPIC_MESSAGE.to_string());
                return;
            };
            state.start_loading();
            state.error = None;
            ticket
        };

        info!(topic = %ticket.topic, "Fetching content");
        let result = self.remote.fetch_content(&ticket.topic).await;

        {
            let mut state = self.state.lock().await;
            state.finish_loading();
            if !state.session.is_current(&ticket) {
                debug!(topic = %ticket.topic, "Discarding content for a stale topic");
                return;
            }

            match result {
                Ok(collection) => {
                    debug!(topic = %ticket.topic, items = collection.content.len(), "Content fetched");
                    state.session.content = Some(collection);
                }
                Err(e) => {
                    warn!(topic = %ticket.topic, error = %e, "Content fetch failed");
                    state.error = Some(e.to_string());
                    if state.session.content.is_none() {
                        info!(topic = %ticket.topic, "Using default content");
                        state.session.content = Some(ContentCollection {
                            topic: ticket.topic.clone(),
                            content: fallback::default_content(&ticket.topic),
                            fetched_at: Utc::now(),
                        });
                    }
                }
            }
        }

        self.load_deep_questions(ticket).await;
    }

    /// Fetches deep questions for the current topic. Failures are recorded, never substituted.
    pub async fn fetch_deep_questions(&self) {
        let ticket = self.state.lock().await.session.ticket();
        if let Some(ticket) = ticket {
            self.load_deep_questions(ticket).await;
        }
    }

    async fn load_deep_questions(&self, ticket: Ticket) {
        let result = self.remote.fetch_deep_questions(&ticket.topic).await;

        let mut state = self.state.lock().await;
        if !state.session.is_current(&ticket) {
            debug!(topic = %ticket.topic, "Discarding questions for a stale topic");
            return;
        }
        match result {
            Ok(questions) => state.session.questions = questions,
            Err(e) => {
                warn!(topic = %ticket.topic, error = %e, "Deep question fetch failed");
                state.error = Some(e.to_string());
            }
        }
    }

    /// Fetches recommendations and records the exploration percentage on the user.
    pub async fn fetch_cross_disciplinary_recommendations(&self) {
        let (user_id, ticket) = {
            let state = self.state.lock().await;
            let Some(user) = state.user.as_ref() else {
                return;
            };
            let Some(ticket) = state.session.ticket() else {
                return;
            };
            (user.id.clone(), ticket)
        };

        let result = self
            .remote
            .fetch_cross_disciplinary_recommendations(&user_id, &ticket.topic)
            .await;

        let mut state = self.state.lock().await;
        if !state.session.is_current(&ticket) {
            debug!(topic = %ticket.topic, "Discarding recommendations for a stale topic");
            return;
        }
        match result {
            Ok(exploration) => {
                let percentage = exploration.exploration_percentage.min(MAX_PROGRESS);
                state.session.recommendations = exploration.recommendations;
                state.session.exploration_percentage = percentage;
                if let Some(user) = state.user.as_mut() {
                    user.explored_topics.insert(ticket.topic.clone(), percentage);
                }
                if let Some(user) = state.user.as_ref() {
                    self.persist(user).await;
                }
            }
            Err(e) => {
                warn!(topic = %ticket.topic, error = %e, "Recommendation fetch failed");
                state.error = Some(e.to_string());
            }
        }
    }

    /// Fetches the learning path for the current topic, falling back to the default path.
    pub async fn fetch_learning_path(&self) {
        let (user_id, ticket) = {
            let mut state = self.state.lock().await;
            let Some(user_id) = state.user.as_ref().map(|u| u.id.clone()) else {
                return;
            };
            let Some(ticket) = state.session.ticket() else {
                return;
            };
            state.start_loading();
            (user_id, ticket)
        };

        let result = self.remote.fetch_learning_path(&user_id, &ticket.topic).await;

        let mut state = self.state.lock().await;
        state.finish_loading();
        if !state.session.is_current(&ticket) {
            debug!(topic = %ticket.topic, "Discarding learning path for a stale topic");
            return;
        }
        match result {
            Ok(path) => state.session.learning_path = Some(path),
            Err(e) => {
                warn!(topic = %ticket.topic, error = %e, "Learning path fetch failed; using fallback");
                state.error = Some(e.to_string());
                state.session.learning_path = Some(fallback::learning_path(&ticket.topic));
            }
        }
    }

    // --- Progress ---

    /// Records an activity against the goal for the current topic.
    ///
    /// The activity and the progress bump are applied and persisted locally first. The
    /// upload runs in the background and its outcome never touches local state.
    pub async fn record_activity(&self, content_id: &str, action: ActivityAction) {
        let (user_id, activity) = {
            let mut state = self.state.lock().await;
            let topic = state.session.topic.clone();
            let Some(user) = state.user.as_mut() else {
                return;
            };
            if user.goal_for_topic(&topic).is_none() {
                debug!(topic = %topic, "No goal for the current topic; activity not recorded");
                return;
            }

            let activity = LearningActivity {
                id: Uuid::new_v4().to_string(),
                content_id: content_id.to_string(),
                action,
                duration: None,
                timestamp: Utc::now(),
            };
            user.learning_history.push(activity.clone());

            if let Some(increment) = action.progress_increment() {
                if let Some(goal) = user.goal_for_topic_mut(&topic) {
                    let progress = goal.advance(increment);
                    debug!(goal = %goal.goal, progress, "Goal progress advanced");
                }
            }

            let user_id = user.id.clone();
            if let Some(user) = state.user.as_ref() {
                self.persist(user).await;
            }
            (user_id, activity)
        };

        let remote = Arc::clone(&self.remote);
        self.background.spawn(async move {
            match remote.record_activity(&user_id, &activity).await {
                Ok(()) => debug!(
                    content_id = %activity.content_id,
                    action = %activity.action,
                    "Recorded activity"
                ),
                Err(e) => warn!(
                    content_id = %activity.content_id,
                    error = %e,
                    "Activity upload failed; keeping local record"
                ),
            }
        });
    }

    /// Reports an interaction to the service and only keeps it locally once the service accepts it.
    pub async fn record_content_interaction(
        &self,
        content_id: &str,
        action: ActivityAction,
        duration: Option<Duration>,
    ) {
        let Some(user_id) = self
            .state
            .lock()
            .await
            .user
            .as_ref()
            .map(|u| u.id.clone())
        else {
            return;
        };

        let result = self
            .remote
            .record_progress(&user_id, content_id, action, duration)
            .await;

        let mut state = self.state.lock().await;
        match result {
            Ok(()) => {
                let activity = LearningActivity {
                    id: Uuid::new_v4().to_string(),
                    content_id: content_id.to_string(),
                    action,
                    duration,
                    timestamp: Utc::now(),
                };
                if let Some(user) = state.user.as_mut() {
                    user.learning_history.push(activity);
                }
                if let Some(user) = state.user.as_ref() {
                    self.persist(user).await;
                }
            }
            Err(e) => {
                warn!(content_id, error = %e, "Progress report failed");
                state.error = Some(e.to_string());
            }
        }
    }

    /// Raises the current goal's progress by `increment`, capped at 100.
    pub async fn update_progress_for_current_goal(&self, increment: u8) {
        let mut state = self.state.lock().await;
        let topic = state.session.topic.clone();
        let Some(goal) = state
            .user
            .as_mut()
            .and_then(|user| user.goal_for_topic_mut(&topic))
        else {
            return;
        };
        let progress = goal.advance(increment);
        debug!(topic = %topic, progress, "Goal progress updated");

        if let Some(user) = state.user.as_ref() {
            self.persist(user).await;
        }
    }
}
