//! Config documents, their resolution and operator settings.
//!
//! - [`definition`]: serde types for checks, rules, rule sets and actions.
//! - [`schema`]: structural validation and the parse → validate → resolve
//!   pipeline ([`parse_document`]).
//! - [`resolver`]: named definition extraction and reference insertion.
//! - [`settings`]: operator TOML settings (cache defaults, per-community
//!   overrides).

pub mod definition;
pub mod resolver;
pub mod schema;
pub mod settings;

pub use definition::{
    ActionDefinition, ActionEntry, CheckDefinition, JoinOperator, ModerationConfig,
    NamedDefinition, RuleDefinition, RuleEntry, RuleSetDefinition, UserResultCacheOptions,
};
pub use resolver::{NamedRegistry, normalize_name, resolve, resolve_config};
pub use schema::{load_document, parse_document, validate_document};
pub use settings::Settings;
