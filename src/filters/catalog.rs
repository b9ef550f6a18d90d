// SPDX-License-Identifier: GPL-3.0-only

//! Static registry of filter presets

use super::{Adjustments, FilterPreset};
use crate::constants::RECENT_FILTERS_LIMIT;
use crate::errors::{AppError, AppResult};
use std::collections::{HashSet, VecDeque};

/// Ordered, immutable set of filter presets
///
/// Listing order is basic presets first, then premium presets, each group in
/// insertion order.
#[derive(Debug, Clone)]
pub struct FilterCatalog {
    presets: Vec<FilterPreset>,
}

impl FilterCatalog {
    /// Build a catalog from arbitrary presets
    ///
    /// Fails if two presets share an id.
    pub fn new(presets: Vec<FilterPreset>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for preset in &presets {
            if !seen.insert(preset.id.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate filter id: {}",
                    preset.id
                )));
            }
        }

        // Stable partition keeps insertion order inside each group
        let (mut ordered, premium): (Vec<_>, Vec<_>) =
            presets.into_iter().partition(|p| !p.premium_required);
        ordered.extend(premium);

        Ok(Self { presets: ordered })
    }

    /// The presets shipped with the application
    pub fn builtin() -> Self {
        let presets = vec![
            FilterPreset::basic("normal", "Normal", Adjustments::default()),
            FilterPreset::basic(
                "vivid",
                "Vivid",
                Adjustments {
                    saturation: Some(1.5),
                    contrast: Some(1.2),
                    ..Default::default()
                },
            ),
            FilterPreset::basic(
                "warm",
                "Warm",
                Adjustments {
                    temperature: Some(0.3),
                    saturation: Some(1.1),
                    ..Default::default()
                },
            ),
            FilterPreset::basic(
                "cool",
                "Cool",
                Adjustments {
                    temperature: Some(-0.3),
                    saturation: Some(1.1),
                    ..Default::default()
                },
            ),
            FilterPreset::basic(
                "bw",
                "B&W",
                Adjustments {
                    saturation: Some(0.0),
                    ..Default::default()
                },
            ),
            FilterPreset::ai("cartoon", "Cartoon"),
            FilterPreset::ai("anime", "Anime"),
            FilterPreset::ai("oil-painting", "Oil Painting"),
            FilterPreset::ai("sketch", "Sketch"),
            FilterPreset::ai("cyberpunk", "Cyberpunk"),
        ];

        Self { presets }
    }

    /// All presets in listing order
    pub fn list(&self) -> &[FilterPreset] {
        &self.presets
    }

    /// Look up a preset by id
    pub fn get(&self, id: &str) -> AppResult<&FilterPreset> {
        self.presets
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::FilterNotFound(id.to_string()))
    }
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Most-recently-used filter ids, newest first, without duplicates
#[derive(Debug, Clone)]
pub struct RecentFilters {
    ids: VecDeque<String>,
    limit: usize,
}

impl RecentFilters {
    pub fn new(limit: usize) -> Self {
        Self {
            ids: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Move `id` to the front, dropping the oldest entry past the limit
    pub fn record(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
        self.ids.push_front(id.to_string());
        self.ids.truncate(self.limit);
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl Default for RecentFilters {
    fn default() -> Self {
        Self::new(RECENT_FILTERS_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lists_basic_before_premium() {
        let catalog = FilterCatalog::builtin();
        let first_premium = catalog
            .list()
            .iter()
            .position(|p| p.premium_required)
            .unwrap();
        assert!(catalog.list()[first_premium..].iter().all(|p| p.premium_required));
        assert_eq!(catalog.list()[0].id, "normal");
    }

    #[test]
    fn new_partitions_and_keeps_insertion_order() {
        let catalog = FilterCatalog::new(vec![
            FilterPreset::ai("anime", "Anime"),
            FilterPreset::basic("a", "A", Adjustments::default()),
            FilterPreset::ai("sketch", "Sketch"),
            FilterPreset::basic("b", "B", Adjustments::default()),
        ])
        .unwrap();
        let ids: Vec<_> = catalog.list().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "anime", "sketch"]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = FilterCatalog::new(vec![
            FilterPreset::ai("anime", "Anime"),
            FilterPreset::ai("anime", "Anime 2"),
        ]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let catalog = FilterCatalog::builtin();
        for id in ["", "VIVID", "does-not-exist", "ai_1"] {
            assert!(matches!(catalog.get(id), Err(AppError::FilterNotFound(got)) if got == id));
        }
        assert!(catalog.get("vivid").is_ok());
    }

    #[test]
    fn recent_filters_are_unique_and_capped() {
        let mut recent = RecentFilters::new(3);
        for id in ["a", "b", "c", "a", "d"] {
            recent.record(id);
        }
        let ids: Vec<_> = recent.ids().collect();
        assert_eq!(ids, vec!["d", "a", "c"]);
    }
}
