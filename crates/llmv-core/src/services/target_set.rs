//! Target Set Builder.
//!
//! Turns a registry snapshot into the ordered, deduplicated list of
//! (provider, model) pairs to probe. Pairs that cannot be probed are kept in
//! a separate skipped list with a reason, never silently dropped.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ProviderTarget, RegistrySnapshot, Target, TargetKey};

/// Why a registry entry did not become a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The provider has no usable credential reference.
    MissingCredential,
    /// The model names a provider absent from the snapshot.
    UnknownProvider,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => f.write_str("MissingCredential"),
            Self::UnknownProvider => f.write_str("UnknownProvider"),
        }
    }
}

/// A registry entry excluded from probing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTarget {
    pub target: TargetKey,
    pub reason: SkipReason,
}

/// Targets to probe plus the entries that were excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSet {
    targets: Vec<Target>,
    skipped: Vec<SkippedTarget>,
}

impl TargetSet {
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn skipped(&self) -> &[SkippedTarget] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn find(&self, key: &TargetKey) -> Option<&Target> {
        self.targets.iter().find(|t| &t.key == key)
    }
}

/// Build the target set for a run.
///
/// Order follows the snapshot's model list. The first occurrence of a
/// (provider, model) pair wins; later duplicates are ignored whether they
/// would have been probed or skipped. When provider ids repeat, the first
/// provider entry is used.
pub fn build_target_set(snapshot: &RegistrySnapshot) -> TargetSet {
    let mut providers: HashMap<&str, &ProviderTarget> = HashMap::new();
    for provider in &snapshot.providers {
        providers.entry(provider.id.as_str()).or_insert(provider);
    }

    let mut seen: HashSet<TargetKey> = HashSet::new();
    let mut set = TargetSet::default();

    for model in &snapshot.models {
        let key = TargetKey::new(&model.provider_id, &model.model_id);
        if !seen.insert(key.clone()) {
            debug!(target_key = %key, "Ignoring duplicate registry entry");
            continue;
        }

        let Some(provider) = providers.get(model.provider_id.as_str()) else {
            set.skipped.push(SkippedTarget {
                target: key,
                reason: SkipReason::UnknownProvider,
            });
            continue;
        };

        match provider.credential.as_ref().filter(|c| c.is_usable()) {
            Some(credential) => set.targets.push(Target {
                key,
                base_url: provider.base_url.clone(),
                credential: credential.clone(),
                auth_style: provider.auth_style.clone(),
                metadata: model.metadata.clone(),
            }),
            None => set.skipped.push(SkippedTarget {
                target: key,
                reason: SkipReason::MissingCredential,
            }),
        }
    }

    set
}
