//! services/client/src/adapters/mod.rs
//!
//! Concrete implementations of the core ports.

pub mod http;
pub mod offline;
pub mod store;

pub use http::HttpLearningService;
pub use offline::OfflineLearningService;
pub use store::SqliteUserStore;
