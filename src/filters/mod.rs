// SPDX-License-Identifier: GPL-3.0-only

//! Filter presets
//!
//! A preset is either a **basic** parametric adjustment applied locally or an
//! **AI** preset delegated to the remote processing service. The two shapes are
//! modelled as a tagged [`FilterKind`] so the processing pipeline can branch on
//! them exhaustively.
//!
//! Presets are immutable once the catalog is built.

mod catalog;

pub use catalog::{FilterCatalog, RecentFilters};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, fixed filter definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreset {
    /// Unique id within the catalog
    pub id: String,
    /// Name shown to the user
    pub display_name: String,
    /// What applying the preset means
    pub kind: FilterKind,
    /// Whether the preset is gated behind the `aiFilters` entitlement
    pub premium_required: bool,
}

impl FilterPreset {
    /// Create a basic (local) preset
    pub fn basic(id: &str, display_name: &str, adjustments: Adjustments) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            kind: FilterKind::Basic { adjustments },
            premium_required: false,
        }
    }

    /// Create a premium AI preset; the model id defaults to the preset id
    pub fn ai(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            kind: FilterKind::Ai {
                model_id: id.to_string(),
            },
            premium_required: true,
        }
    }

    pub fn is_ai(&self) -> bool {
        matches!(self.kind, FilterKind::Ai { .. })
    }

    /// Parameter mapping sent along with remote requests
    pub fn settings(&self) -> BTreeMap<String, f32> {
        match &self.kind {
            FilterKind::Basic { adjustments } => adjustments.as_settings(),
            FilterKind::Ai { .. } => BTreeMap::new(),
        }
    }
}

/// Filter variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterKind {
    /// Parametric adjustment applied on-device
    Basic { adjustments: Adjustments },
    /// Style transfer performed by the remote AI service
    Ai {
        #[serde(rename = "modelId")]
        model_id: String,
    },
}

/// Parametric adjustments of a basic preset
///
/// Unset fields are not applied at all.
///
/// - `brightness`: additive offset (-1.0 to 1.0, 0.0 = no change)
/// - `contrast`: multiplier around mid-grey (1.0 = no change)
/// - `saturation`: multiplier around luma (0.0 = greyscale, 1.0 = no change)
/// - `temperature`: warm/cool shift (-1.0 cool to 1.0 warm)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A single adjustment step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    Brightness(f32),
    Contrast(f32),
    Saturation(f32),
    Temperature(f32),
}

impl Adjustment {
    pub fn name(&self) -> &'static str {
        match self {
            Adjustment::Brightness(_) => "brightness",
            Adjustment::Contrast(_) => "contrast",
            Adjustment::Saturation(_) => "saturation",
            Adjustment::Temperature(_) => "temperature",
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            Adjustment::Brightness(v)
            | Adjustment::Contrast(v)
            | Adjustment::Saturation(v)
            | Adjustment::Temperature(v) => v,
        }
    }
}

impl Adjustments {
    /// Adjustments in application order: brightness, contrast, saturation, temperature
    pub fn ordered(&self) -> Vec<Adjustment> {
        [
            self.brightness.map(Adjustment::Brightness),
            self.contrast.map(Adjustment::Contrast),
            self.saturation.map(Adjustment::Saturation),
            self.temperature.map(Adjustment::Temperature),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// True when no adjustment is set
    pub fn is_identity(&self) -> bool {
        self.ordered().is_empty()
    }

    pub fn as_settings(&self) -> BTreeMap<String, f32> {
        self.ordered()
            .into_iter()
            .map(|a| (a.name().to_string(), a.value()))
            .collect()
    }
}
