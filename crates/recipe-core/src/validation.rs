//! Knob override validation.
//!
//! [`KnobValidator::validate`] classifies one raw override value against the
//! knob catalog and the baseline override map. Validity and redundancy are
//! independent axes: a value can be a WARNING and redundant at once.
//!
//! Rules, first match wins:
//! 1. empty value: `MissingValue`, never redundant
//! 2. no catalog entry: `UnknownParameter`
//! 3. `oneof`: case-insensitive option match, else `InvalidSelection`
//! 4. `numeric`: must hex-parse (`NonNumeric`), then `OutOfRange` on bounds
//! 5. otherwise OK

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::knob::{parse_hex, KnobCatalog, KnobKind, KnobMeta};
use crate::overrides::OverrideMap;

/// Message attached to an OK value that equals its baseline.
pub const REDUNDANT_MESSAGE: &str = "Value matches baseline (no active override)";

/// Validation status shown for an override.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KnobStatus {
    Ok,
    Warning,
}

/// Which numeric bound a value violated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RangeBound {
    Min,
    Max,
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBound::Min => f.write_str("Below min"),
            RangeBound::Max => f.write_str("Above max"),
        }
    }
}

/// Recoverable problems with an override value. Display-only: none of them
/// block writes, imports, copies or commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KnobWarning {
    #[error("Missing value - please define setting")]
    MissingValue,

    #[error("Unknown parameter: not found in baseline catalog")]
    UnknownParameter,

    #[error("Invalid selection: \"{value}\" is not a supported option for this knob.")]
    InvalidSelection { value: String },

    #[error("Value must be numeric")]
    NonNumeric,

    #[error("{bound} ({limit})")]
    OutOfRange { bound: RangeBound, limit: String },
}

/// Outcome of validating one override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnobValidation {
    pub warning: Option<KnobWarning>,
    pub is_redundant: bool,
}

impl KnobValidation {
    pub fn status(&self) -> KnobStatus {
        if self.warning.is_some() {
            KnobStatus::Warning
        } else {
            KnobStatus::Ok
        }
    }

    pub fn is_warning(&self) -> bool {
        self.warning.is_some()
    }

    /// Human-readable message, if any.
    pub fn message(&self) -> Option<String> {
        match &self.warning {
            Some(warning) => Some(warning.to_string()),
            None if self.is_redundant => Some(REDUNDANT_MESSAGE.to_string()),
            None => None,
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Validator bound to one knob catalog and one baseline override map.
#[derive(Debug, Clone, Copy)]
pub struct KnobValidator<'a> {
    catalog: &'a KnobCatalog,
    baseline: &'a OverrideMap,
}

impl<'a> KnobValidator<'a> {
    pub fn new(catalog: &'a KnobCatalog, baseline: &'a OverrideMap) -> Self {
        Self { catalog, baseline }
    }

    pub fn catalog(&self) -> &'a KnobCatalog {
        self.catalog
    }

    pub fn meta(&self, name: &str) -> Option<&'a KnobMeta> {
        self.catalog.get(name)
    }

    /// Baseline for `name`: the baseline override if supplied, else the
    /// catalog default, else none.
    pub fn baseline_value(&self, name: &str) -> Option<&'a str> {
        self.baseline
            .get(name)
            .map(String::as_str)
            .or_else(|| self.meta(name).map(|m| m.default_value.as_str()))
    }

    /// Whether `raw` equals the applicable baseline, case-insensitively.
    pub fn is_redundant(&self, name: &str, raw: &str) -> bool {
        self.baseline_value(name)
            .is_some_and(|baseline| eq_ignore_case(raw, baseline))
    }

    pub fn validate(&self, name: &str, raw: &str) -> KnobValidation {
        if raw.is_empty() {
            return KnobValidation {
                warning: Some(KnobWarning::MissingValue),
                is_redundant: false,
            };
        }

        let is_redundant = self.is_redundant(name, raw);
        let warning = match self.meta(name) {
            None => Some(KnobWarning::UnknownParameter),
            Some(meta) => check_constraints(meta, raw),
        };

        KnobValidation {
            warning,
            is_redundant,
        }
    }

    /// Display form of a raw value: option text for `oneof`, Enabled /
    /// Disabled for checkboxes, `Empty` for an empty value.
    pub fn display_value(&self, name: &str, raw: &str) -> String {
        if let Some(meta) = self.meta(name) {
            match &meta.kind {
                KnobKind::OneOf { .. } => {
                    return match meta.option_for(raw) {
                        Some(option) => format!("{} ({})", option.text, raw),
                        None if raw.is_empty() => "Empty".to_string(),
                        None => format!("Invalid: {}", raw),
                    };
                }
                KnobKind::Checkbox => {
                    return if raw == "0x1" { "Enabled" } else { "Disabled" }.to_string();
                }
                KnobKind::Numeric { .. } | KnobKind::FreeText => {}
            }
        }
        if raw.is_empty() {
            "Empty".to_string()
        } else {
            raw.to_string()
        }
    }
}

fn check_constraints(meta: &KnobMeta, raw: &str) -> Option<KnobWarning> {
    match &meta.kind {
        KnobKind::OneOf { .. } => {
            if meta.option_for(raw).is_some() {
                None
            } else {
                Some(KnobWarning::InvalidSelection {
                    value: raw.to_string(),
                })
            }
        }
        KnobKind::Numeric { min, max } => {
            let Some(value) = parse_hex(raw) else {
                return Some(KnobWarning::NonNumeric);
            };
            if let Some(min) = min.as_ref().filter(|min| value < min.value()) {
                return Some(KnobWarning::OutOfRange {
                    bound: RangeBound::Min,
                    limit: min.raw().to_string(),
                });
            }
            if let Some(max) = max.as_ref().filter(|max| value > max.value()) {
                return Some(KnobWarning::OutOfRange {
                    bound: RangeBound::Max,
                    limit: max.raw().to_string(),
                });
            }
            None
        }
        KnobKind::Checkbox | KnobKind::FreeText => None,
    }
}
