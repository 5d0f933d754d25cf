// Moderation infrastructure - classifier clients and decision stores.

pub mod ai_classifier;
pub mod http_classifier;
pub mod in_memory;
pub mod offline_classifier;
pub mod sqlite_decision_store;

pub use ai_classifier::AiRiskClassifier;
pub use http_classifier::HttpRiskClassifier;
pub use in_memory::InMemoryDecisionStore;
pub use offline_classifier::OfflineClassifier;
pub use sqlite_decision_store::SqliteDecisionStore;
