// SPDX-License-Identifier: GPL-3.0-only

//! Subscription entitlements and the filter gate
//!
//! The orchestrator never reads entitlement state from an ambient source. It is
//! handed an [`EntitlementSnapshot`] value and re-handed a new one whenever the
//! subscription changes.

use crate::constants::ExportQuality;
use crate::filters::FilterPreset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Premium,
}

impl Tier {
    /// Map a backend subscription type; anything unrecognised is treated as free
    pub fn from_subscription_type(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "premium" => Tier::Premium,
            _ => Tier::Free,
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" | "basic" => Ok(Tier::Free),
            "premium" => Ok(Tier::Premium),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

/// Capabilities unlocked by a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    BasicFilters,
    AdvancedFilters,
    AiFilters,
    NoWatermark,
    HighRes,
    UnlimitedStories,
    TextToImage,
    ImageToVideo,
    BackgroundRemoval,
    AdsDisabled,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::BasicFilters,
        Capability::AdvancedFilters,
        Capability::AiFilters,
        Capability::NoWatermark,
        Capability::HighRes,
        Capability::UnlimitedStories,
        Capability::TextToImage,
        Capability::ImageToVideo,
        Capability::BackgroundRemoval,
        Capability::AdsDisabled,
    ];
}

/// Read-only view of what the current subscription allows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementSnapshot {
    pub tier: Tier,
    /// Capability name → enabled; missing entries count as disabled
    pub feature_flags: BTreeMap<Capability, bool>,
}

impl EntitlementSnapshot {
    /// The standard feature set of a tier
    pub fn for_tier(tier: Tier) -> Self {
        let feature_flags = Capability::ALL
            .into_iter()
            .map(|cap| {
                let enabled = match tier {
                    Tier::Premium => true,
                    Tier::Free => cap == Capability::BasicFilters,
                };
                (cap, enabled)
            })
            .collect();

        Self {
            tier,
            feature_flags,
        }
    }

    pub fn free() -> Self {
        Self::for_tier(Tier::Free)
    }

    pub fn premium() -> Self {
        Self::for_tier(Tier::Premium)
    }

    /// Override a single flag
    pub fn with_flag(mut self, capability: Capability, enabled: bool) -> Self {
        self.feature_flags.insert(capability, enabled);
        self
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.feature_flags.get(&capability).copied().unwrap_or(false)
    }

    /// Highest export quality this entitlement allows
    pub fn export_quality(&self) -> ExportQuality {
        if self.has(Capability::HighRes) {
            ExportQuality::High
        } else {
            ExportQuality::Standard
        }
    }
}

/// Whether `filter` may be used under `entitlement`
pub fn is_allowed(filter: &FilterPreset, entitlement: &EntitlementSnapshot) -> bool {
    !filter.premium_required || entitlement.has(Capability::AiFilters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterCatalog;

    #[test]
    fn free_tier_only_unlocks_basic_filters() {
        let free = EntitlementSnapshot::free();
        assert!(free.has(Capability::BasicFilters));
        assert!(!free.has(Capability::AiFilters));
        assert!(!free.has(Capability::NoWatermark));
    }

    #[test]
    fn gate_blocks_premium_filters_without_ai_flag() {
        let catalog = FilterCatalog::builtin();
        let free = EntitlementSnapshot::free();
        let premium = EntitlementSnapshot::premium();

        for preset in catalog.list() {
            assert_eq!(is_allowed(preset, &free), !preset.premium_required);
            assert!(is_allowed(preset, &premium));
        }
    }

    #[test]
    fn gate_only_consults_ai_flag() {
        let anime = FilterPreset::ai("anime", "Anime");
        let snapshot = EntitlementSnapshot::free().with_flag(Capability::AiFilters, true);
        assert_eq!(snapshot.tier, Tier::Free);
        assert!(is_allowed(&anime, &snapshot));

        let empty = EntitlementSnapshot::default();
        assert!(!is_allowed(&anime, &empty));
    }

    #[test]
    fn unknown_subscription_types_map_to_free() {
        assert_eq!(Tier::from_subscription_type("Premium"), Tier::Premium);
        assert_eq!(Tier::from_subscription_type("basic"), Tier::Free);
        assert_eq!(Tier::from_subscription_type("gold"), Tier::Free);
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn export_quality_follows_high_res_flag() {
        assert_eq!(EntitlementSnapshot::free().export_quality(), ExportQuality::Standard);
        assert_eq!(EntitlementSnapshot::premium().export_quality(), ExportQuality::High);
        let boosted = EntitlementSnapshot::free().with_flag(Capability::HighRes, true);
        assert_eq!(boosted.export_quality(), ExportQuality::High);
    }
}
