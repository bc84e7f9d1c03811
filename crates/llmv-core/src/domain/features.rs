//! Feature flags a model advertises in the registry.
//!
//! Advertised flags are claims, not measurements. The probes decide what a
//! model actually supports; the flags widen the capability denominator so a
//! claimed feature that never got measured still counts against the model.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Features a model claims to support.
    ///
    /// Absence means "not claimed", not "known to be unsupported".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[repr(transparent)]
    pub struct AdvertisedFeatures: u32 {
        /// Server-sent event streaming of chat completions.
        const STREAMING        = 0b0000_0001;
        /// Tool / function calling in chat completions.
        const FUNCTION_CALLING = 0b0000_0010;
        /// Image inputs in chat messages.
        const VISION           = 0b0000_0100;
        /// An embeddings endpoint for this model.
        const EMBEDDINGS       = 0b0000_1000;
        /// Brotli-compressed responses.
        const COMPRESSION      = 0b0001_0000;
    }
}

const FEATURE_NAMES: [(&str, AdvertisedFeatures); 5] = [
    ("streaming", AdvertisedFeatures::STREAMING),
    ("function_calling", AdvertisedFeatures::FUNCTION_CALLING),
    ("vision", AdvertisedFeatures::VISION),
    ("embeddings", AdvertisedFeatures::EMBEDDINGS),
    ("compression", AdvertisedFeatures::COMPRESSION),
];

impl AdvertisedFeatures {
    /// Lowercase names of the set flags, in declaration order.
    pub fn names(self) -> Vec<&'static str> {
        FEATURE_NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Look up a single flag by its lowercase name.
    pub fn from_feature_name(name: &str) -> Option<Self> {
        FEATURE_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, flag)| *flag)
    }
}

// Registry files list features by name; the database stores the bits.
impl Serialize for AdvertisedFeatures {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.names().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AdvertisedFeatures {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        names.iter().try_fold(Self::empty(), |acc, name| {
            Self::from_feature_name(name)
                .map(|flag| acc | flag)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown feature '{name}'")))
        })
    }
}
