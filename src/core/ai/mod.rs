pub mod enhancement_service;
pub mod models;

pub use enhancement_service::{AiProvider, EnhancementError, EnhancementService};
pub use models::{AiConfig, AiMessage, AiProviderResponse, AuthorContext};
