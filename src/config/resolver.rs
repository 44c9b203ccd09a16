//! Named definition resolution.
//!
//! Rules and actions may be given a `name` anywhere in a config document and
//! referenced by that name (a plain string) from any check. Resolution runs
//! in two passes over the whole document:
//!
//! 1. **Extraction** collects every named definition into a [`NamedRegistry`],
//!    descending into nested rule sets. Names are compared trimmed and
//!    case-insensitively. A name may be declared more than once only if
//!    every declaration is identical apart from the name itself.
//! 2. **Insertion** replaces each string reference with the registered
//!    definition, again descending into nested rule sets.
//!
//! The registry is an explicit accumulator: each extraction step takes it by
//! value and hands it back, so nothing is shared between calls. Order of
//! checks, rules and actions is preserved; only references change.

use std::collections::HashMap;

use tracing::debug;

use super::definition::{
    ActionDefinition, ActionEntry, CheckDefinition, ModerationConfig, NamedDefinition,
    RuleDefinition, RuleEntry, RuleSetDefinition,
};
use crate::{ModsieveError, Result};

/// Normalized name → canonical definition.
#[derive(Debug, Clone)]
pub struct NamedRegistry<T> {
    entries: HashMap<String, T>,
}

impl<T> Default for NamedRegistry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

/// Trim and lower-case a definition name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl<T: NamedDefinition> NamedRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition` if it has a name.
    ///
    /// Fails with [`ModsieveError::DuplicateName`] if the name is already
    /// taken by a structurally different definition.
    pub fn register(mut self, definition: &T) -> Result<Self> {
        let Some(name) = definition.name() else {
            return Ok(self);
        };
        let key = normalize_name(name);
        match self.entries.get(&key) {
            Some(existing) if existing.without_name() != definition.without_name() => {
                return Err(ModsieveError::DuplicateName {
                    kind: T::LABEL,
                    name: name.to_string(),
                });
            }
            Some(_) => {}
            None => {
                debug!(kind = T::LABEL, name, "registered named definition");
                self.entries.insert(key, definition.clone());
            }
        }
        Ok(self)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(&normalize_name(name))
    }

    /// Lookup that fails with [`ModsieveError::UnresolvedReference`].
    pub fn resolve(&self, name: &str) -> Result<T> {
        self.get(name)
            .cloned()
            .ok_or_else(|| ModsieveError::UnresolvedReference {
                kind: T::LABEL,
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collect named rules from `entries` (and nested sets) into `registry`.
pub fn extract_named_rules(
    entries: &[RuleEntry],
    registry: NamedRegistry<RuleDefinition>,
) -> Result<NamedRegistry<RuleDefinition>> {
    entries
        .iter()
        .try_fold(registry, |registry, entry| match entry {
            RuleEntry::Reference(_) => Ok(registry),
            RuleEntry::Rule(rule) => registry.register(rule),
            RuleEntry::Set(set) => extract_named_rules(&set.rules, registry),
        })
}

/// Collect named actions from `entries` into `registry`.
pub fn extract_named_actions(
    entries: &[ActionEntry],
    registry: NamedRegistry<ActionDefinition>,
) -> Result<NamedRegistry<ActionDefinition>> {
    entries
        .iter()
        .try_fold(registry, |registry, entry| match entry {
            ActionEntry::Reference(_) => Ok(registry),
            ActionEntry::Action(action) => registry.register(action),
        })
}

/// Replace rule references in `entries` (and nested sets) with definitions.
pub fn insert_named_rules(
    entries: &[RuleEntry],
    registry: &NamedRegistry<RuleDefinition>,
) -> Result<Vec<RuleEntry>> {
    entries
        .iter()
        .map(|entry| match entry {
            RuleEntry::Reference(name) => registry.resolve(name).map(RuleEntry::Rule),
            RuleEntry::Rule(rule) => Ok(RuleEntry::Rule(rule.clone())),
            RuleEntry::Set(set) => Ok(RuleEntry::Set(RuleSetDefinition {
                condition: set.condition,
                rules: insert_named_rules(&set.rules, registry)?,
            })),
        })
        .collect()
}

/// Replace action references in `entries` with definitions.
pub fn insert_named_actions(
    entries: &[ActionEntry],
    registry: &NamedRegistry<ActionDefinition>,
) -> Result<Vec<ActionEntry>> {
    entries
        .iter()
        .map(|entry| match entry {
            ActionEntry::Reference(name) => registry.resolve(name).map(ActionEntry::Action),
            ActionEntry::Action(action) => Ok(ActionEntry::Action(action.clone())),
        })
        .collect()
}

/// Resolve every reference in `checks`.
///
/// Names are shared across the whole list, so a check may refer to a rule
/// first declared in a later check. Fails without partial results.
pub fn resolve(checks: Vec<CheckDefinition>) -> Result<Vec<CheckDefinition>> {
    let (rules, actions) = checks.iter().try_fold(
        (NamedRegistry::new(), NamedRegistry::new()),
        |(rules, actions), check| {
            Ok::<_, ModsieveError>((
                extract_named_rules(&check.rules, rules)?,
                extract_named_actions(&check.actions, actions)?,
            ))
        },
    )?;

    checks
        .into_iter()
        .map(|check| {
            Ok(CheckDefinition {
                rules: insert_named_rules(&check.rules, &rules)?,
                actions: insert_named_actions(&check.actions, &actions)?,
                ..check
            })
        })
        .collect()
}

/// Resolve every reference in a whole document.
pub fn resolve_config(config: ModerationConfig) -> Result<ModerationConfig> {
    Ok(ModerationConfig {
        checks: resolve(config.checks)?,
        extra: config.extra,
    })
}
