//! Model-alias mapping.
//!
//! Providers expose backend model ids; deployments remap them to
//! client-facing aliases through a per-provider table of [`AliasEntry`]
//! records. Tables are sanitized once at load time and then applied to each
//! provider's model list. One backend id may map to several aliases (one
//! output entry per alias); an entry's `fork` flag keeps the original model
//! alongside the aliased copy instead of renaming it in place.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// One alias rule: backend model `name` becomes client-visible `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub name: String,
    pub alias: String,
    #[serde(default)]
    pub fork: bool,
}

/// One model as advertised to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
}

/// Per-provider alias tables, keyed by provider id.
pub type AliasTable = HashMap<String, Vec<AliasEntry>>;

/// Sanitize a configured alias table:
///
/// - provider keys are trimmed and lower-cased
/// - every entry's string fields are trimmed
/// - an entry whose alias duplicates an already-accepted alias for the same
///   provider is dropped (first occurrence wins)
pub fn sanitize_alias_table(table: AliasTable) -> AliasTable {
    let mut sanitized: AliasTable = HashMap::new();
    for (provider, entries) in table {
        let provider = provider.trim().to_lowercase();
        let accepted = sanitized.entry(provider.clone()).or_default();
        let mut seen: HashSet<String> = accepted.iter().map(|e| e.alias.clone()).collect();
        for entry in entries {
            let entry = AliasEntry {
                name: entry.name.trim().to_string(),
                alias: entry.alias.trim().to_string(),
                fork: entry.fork,
            };
            if !seen.insert(entry.alias.clone()) {
                tracing::warn!(
                    provider = %provider,
                    alias = %entry.alias,
                    "duplicate model alias dropped"
                );
                continue;
            }
            accepted.push(entry);
        }
    }
    sanitized
}

/// Apply a provider's alias entries to its advertised model list.
///
/// Entries match against the *original* backend id, so one id can yield one
/// output model per alias, in configured order. The original model is
/// retained (first) when any matching entry forks; otherwise the aliases
/// replace it. Models with no matching entry pass through unchanged. The
/// display name is rewritten by substituting the backend id with the alias.
pub fn apply_alias_entries(
    table: &AliasTable,
    provider: &str,
    models: Vec<ModelEntry>,
) -> Vec<ModelEntry> {
    let Some(entries) = table.get(&provider.trim().to_lowercase()) else {
        return models;
    };

    let mut out = Vec::with_capacity(models.len());
    for model in models {
        let matching: Vec<&AliasEntry> =
            entries.iter().filter(|entry| entry.name == model.id).collect();
        if matching.is_empty() {
            out.push(model);
            continue;
        }
        if matching.iter().any(|entry| entry.fork) {
            out.push(model.clone());
        }
        for entry in matching {
            out.push(ModelEntry {
                id: entry.alias.clone(),
                name: model.name.replace(&model.id, &entry.alias),
            });
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
