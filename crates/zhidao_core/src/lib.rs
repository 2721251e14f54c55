pub mod coordinator;
pub mod domain;
pub mod fallback;
pub mod ports;

pub use coordinator::{LearningCoordinator, LearningState, TopicSession};
pub use domain::{
    ActivityAction, Content, ContentCollection, ContentKind, CreatedGoal,
    CrossDisciplinaryRecommendation, DeepQuestion, Exploration, GoalPriority, LearningActivity,
    LearningGoal, LearningPath, User,
};
pub use ports::{LearningService, PortError, PortResult, RemoteError, RemoteResult, UserStore};
