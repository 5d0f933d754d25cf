// Core moderation module - contains the content moderation business logic.
// Following the same pattern as the ai module: models, pure logic, service + ports.

pub mod moderation_models;
pub mod moderation_notices;
pub mod moderation_policy;
pub mod moderation_service;

pub use moderation_models::*;
pub use moderation_notices::{author_notice, describe_reason, AuthorNotice};
pub use moderation_policy::*;
pub use moderation_service::*;
