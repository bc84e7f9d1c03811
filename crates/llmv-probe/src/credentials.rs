//! Environment-backed credential resolution.

use std::fmt;

use llmv_core::{CredentialRef, CredentialResolver, Secret};

const ENV_PREFIX: &str = "env:";

type Lookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Resolves `env:NAME` references from the process environment.
///
/// Any other non-blank reference is taken as the secret itself. Blank values
/// never resolve.
pub struct EnvCredentialResolver {
    lookup: Box<Lookup>,
}

impl EnvCredentialResolver {
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve `env:` references through `lookup` instead of the process environment.
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvCredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvCredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvCredentialResolver").finish_non_exhaustive()
    }
}

impl CredentialResolver for EnvCredentialResolver {
    fn resolve(&self, reference: &CredentialRef) -> Option<Secret> {
        let raw = reference.as_str().trim();
        let value = match raw.strip_prefix(ENV_PREFIX) {
            Some(name) => (self.lookup)(name.trim())?,
            None => raw.to_string(),
        };
        let value = value.trim();
        (!value.is_empty()).then(|| Secret::new(value))
    }
}
