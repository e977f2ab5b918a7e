//! Derived override views: the four-way filter, its badge counts, and text
//! search.
//!
//! Everything here is a pure reduction over an override map. Nothing is
//! cached except through [`CountsMemo`], which keys results by a content
//! digest so a mutated map can never be served stale counts.

use serde::{Deserialize, Serialize};

use crate::domain::digest::override_summary_digest;
use crate::domain::error::Result;
use crate::overrides::OverrideMap;
use crate::validation::{KnobValidation, KnobValidator};

/// Which overrides to show.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OverrideFilter {
    #[default]
    All,
    /// Values with a WARNING status.
    Warnings,
    /// Values that differ from their baseline.
    Diff,
    /// Keys with no catalog entry.
    User,
}

impl std::str::FromStr for OverrideFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "warnings" => Ok(Self::Warnings),
            "diff" => Ok(Self::Diff),
            "user" => Ok(Self::User),
            other => Err(format!("unknown override filter: {}", other)),
        }
    }
}

/// Badge counts for each filter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterCounts {
    pub all: usize,
    pub warnings: usize,
    pub diff: usize,
    pub user: usize,
}

impl FilterCounts {
    pub fn get(&self, filter: OverrideFilter) -> usize {
        match filter {
            OverrideFilter::All => self.all,
            OverrideFilter::Warnings => self.warnings,
            OverrideFilter::Diff => self.diff,
            OverrideFilter::User => self.user,
        }
    }
}

/// One override with everything a table row needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverrideRow {
    pub knob_name: String,
    pub raw_value: String,
    pub display_value: String,
    pub baseline_value: Option<String>,
    pub category_path: Option<String>,
    pub validation: KnobValidation,
}

fn matches_filter(
    filter: OverrideFilter,
    validator: &KnobValidator<'_>,
    key: &str,
    validation: &KnobValidation,
) -> bool {
    match filter {
        OverrideFilter::All => true,
        OverrideFilter::Warnings => validation.is_warning(),
        OverrideFilter::Diff => !validation.is_redundant,
        OverrideFilter::User => validator.meta(key).is_none(),
    }
}

/// Count every filter bucket in one pass.
pub fn count_overrides(overrides: &OverrideMap, validator: &KnobValidator<'_>) -> FilterCounts {
    overrides
        .iter()
        .fold(FilterCounts::default(), |mut counts, (key, value)| {
            let validation = validator.validate(key, value);
            counts.all += 1;
            if validation.is_warning() {
                counts.warnings += 1;
            }
            if !validation.is_redundant {
                counts.diff += 1;
            }
            if validator.meta(key).is_none() {
                counts.user += 1;
            }
            counts
        })
}

/// Rows passing `filter`, then narrowed by a case-insensitive `search` over
/// knob name, category path, display value and raw value.
pub fn filter_overrides(
    overrides: &OverrideMap,
    validator: &KnobValidator<'_>,
    filter: OverrideFilter,
    search: &str,
) -> Vec<OverrideRow> {
    let needle = search.to_lowercase();
    overrides
        .iter()
        .filter_map(|(key, value)| {
            let validation = validator.validate(key, value);
            if !matches_filter(filter, validator, key, &validation) {
                return None;
            }
            let meta = validator.meta(key);
            let display_value = validator.display_value(key, value);
            if !needle.is_empty() {
                let path = meta.map(|m| m.category_path.as_str()).unwrap_or("");
                let hit = key.to_lowercase().contains(&needle)
                    || path.to_lowercase().contains(&needle)
                    || display_value.to_lowercase().contains(&needle)
                    || value.to_lowercase().contains(&needle);
                if !hit {
                    return None;
                }
            }
            Some(OverrideRow {
                knob_name: key.clone(),
                raw_value: value.clone(),
                display_value,
                baseline_value: validator.baseline_value(key).map(str::to_string),
                category_path: meta.map(|m| m.category_path.clone()),
                validation,
            })
        })
        .collect()
}

/// Single-entry memo of [`FilterCounts`] keyed by content digest.
#[derive(Debug, Default)]
pub struct CountsMemo {
    entry: Option<(String, FilterCounts)>,
    hits: u64,
}

impl CountsMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return memoized counts when the digest of (overrides, catalog,
    /// baseline) is unchanged, otherwise recount and remember.
    pub fn get_or_compute(
        &mut self,
        overrides: &OverrideMap,
        validator: &KnobValidator<'_>,
        baseline: &OverrideMap,
    ) -> Result<FilterCounts> {
        let key = override_summary_digest(overrides, validator.catalog(), baseline)?;
        if let Some((cached_key, counts)) = &self.entry {
            if *cached_key == key {
                self.hits += 1;
                return Ok(*counts);
            }
        }
        let counts = count_overrides(overrides, validator);
        self.entry = Some((key, counts));
        Ok(counts)
    }

    /// Number of lookups answered from the memo.
    pub fn hits(&self) -> u64 {
        self.hits
    }
}
