// Content moderation for the Haus of Basquiat community app.
//
// **Architecture Overview:**
// - `core/` = Business logic (no I/O): the moderation policy, the moderation
//   service and its ports, and the caption enhancement service
// - `infra/` = Implementations of core traits (classifier APIs, SQLite, OpenRouter)
// - `config` = Runtime configuration, passed explicitly into constructors

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;

pub mod config;
