//! Credential resolution port.
//!
//! The registry hands out opaque [`CredentialRef`]s. Resolution to secret
//! material happens at probe time, inside the prober adapter.

use std::fmt;

use crate::domain::CredentialRef;

/// Resolved secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Turns a credential reference into secret material.
pub trait CredentialResolver: Send + Sync {
    /// `None` when the reference cannot be resolved right now.
    fn resolve(&self, reference: &CredentialRef) -> Option<Secret>;
}
