//! Knob metadata: the catalog of known build parameters.
//!
//! The external catalog describes a knob with a `type` tag plus optional
//! `min`/`max`/`options` fields. On load that shape is folded into the
//! [`KnobKind`] sum type so the validator never null-checks constraints.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{KnobMetaError, RecipeError, Result};

/// A hex-encoded integer, keeping the text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexValue {
    raw: String,
    value: i128,
}

impl HexValue {
    /// Parse `[+-][0x]<hexdigits>`. Returns `None` for anything else,
    /// including an empty digit string.
    pub fn parse(text: &str) -> Option<Self> {
        let value = parse_hex(text)?;
        Some(Self {
            raw: text.trim().to_string(),
            value,
        })
    }

    pub fn value(&self) -> i128 {
        self.value
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for HexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse a hex integer with an optional sign and `0x`/`0X` prefix.
pub fn parse_hex(text: &str) -> Option<i128> {
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .unwrap_or(rest);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, 16).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// One selectable value of a `oneof` knob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnobOption {
    pub text: String,
    pub value: String,
}

/// Constraint shape of a knob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnobKind {
    Numeric {
        min: Option<HexValue>,
        max: Option<HexValue>,
    },
    OneOf {
        options: Vec<KnobOption>,
    },
    Checkbox,
    FreeText,
}

/// Wire tag for [`KnobKind`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KnobTypeTag {
    Numeric,
    Oneof,
    Checkbox,
    String,
}

/// A known build parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "KnobMetaRecord", into = "KnobMetaRecord")]
pub struct KnobMeta {
    pub knob_name: String,
    pub kind: KnobKind,
    pub prompt: String,
    pub description: String,
    pub category_path: String,
    pub default_value: String,
    pub current_value: String,
}

impl KnobMeta {
    pub fn type_tag(&self) -> KnobTypeTag {
        match self.kind {
            KnobKind::Numeric { .. } => KnobTypeTag::Numeric,
            KnobKind::OneOf { .. } => KnobTypeTag::Oneof,
            KnobKind::Checkbox => KnobTypeTag::Checkbox,
            KnobKind::FreeText => KnobTypeTag::String,
        }
    }

    /// Option whose value matches `raw`, case-insensitively.
    pub fn option_for(&self, raw: &str) -> Option<&KnobOption> {
        match &self.kind {
            KnobKind::OneOf { options } => {
                let raw = raw.to_lowercase();
                options.iter().find(|o| o.value.to_lowercase() == raw)
            }
            _ => None,
        }
    }
}

/// Catalog wire format for one knob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KnobMetaRecord {
    pub knob_name: String,
    #[serde(rename = "type")]
    pub kind: KnobTypeTag,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_path: String,
    pub default_value: String,
    #[serde(default)]
    pub current_value: Option<String>,
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<KnobOption>>,
}

fn parse_bound(
    knob: &str,
    field: &'static str,
    value: Option<String>,
) -> std::result::Result<Option<HexValue>, KnobMetaError> {
    match value {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => HexValue::parse(&text)
            .map(Some)
            .ok_or_else(|| KnobMetaError::MalformedBound {
                knob: knob.to_string(),
                field,
                value: text,
            }),
    }
}

impl TryFrom<KnobMetaRecord> for KnobMeta {
    type Error = KnobMetaError;

    fn try_from(record: KnobMetaRecord) -> std::result::Result<Self, Self::Error> {
        if record.knob_name.trim().is_empty() {
            return Err(KnobMetaError::EmptyName);
        }
        let kind = match record.kind {
            KnobTypeTag::Numeric => KnobKind::Numeric {
                min: parse_bound(&record.knob_name, "min", record.min)?,
                max: parse_bound(&record.knob_name, "max", record.max)?,
            },
            KnobTypeTag::Oneof => match record.options {
                Some(options) if !options.is_empty() => KnobKind::OneOf { options },
                _ => {
                    return Err(KnobMetaError::MissingOptions {
                        knob: record.knob_name,
                    })
                }
            },
            KnobTypeTag::Checkbox => KnobKind::Checkbox,
            KnobTypeTag::String => KnobKind::FreeText,
        };
        let current_value = record
            .current_value
            .unwrap_or_else(|| record.default_value.clone());
        Ok(Self {
            knob_name: record.knob_name,
            kind,
            prompt: record.prompt,
            description: record.description,
            category_path: record.category_path,
            default_value: record.default_value,
            current_value,
        })
    }
}

impl From<KnobMeta> for KnobMetaRecord {
    fn from(meta: KnobMeta) -> Self {
        let tag = meta.type_tag();
        let (min, max, options) = match meta.kind {
            KnobKind::Numeric { min, max } => (
                min.map(|b| b.raw().to_string()),
                max.map(|b| b.raw().to_string()),
                None,
            ),
            KnobKind::OneOf { options } => (None, None, Some(options)),
            KnobKind::Checkbox | KnobKind::FreeText => (None, None, None),
        };
        Self {
            knob_name: meta.knob_name,
            kind: tag,
            prompt: meta.prompt,
            description: meta.description,
            category_path: meta.category_path,
            default_value: meta.default_value,
            current_value: Some(meta.current_value),
            min,
            max,
            options,
        }
    }
}

/// Folder in the knob category tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryNode {
    pub name: String,
    pub full_path: String,
    pub children: BTreeMap<String, CategoryNode>,
    /// Knob names filed directly under this folder, in catalog order.
    pub knobs: Vec<String>,
}

impl CategoryNode {
    /// Total knobs in this folder and all descendants.
    pub fn knob_count(&self) -> usize {
        self.knobs.len() + self.children.values().map(CategoryNode::knob_count).sum::<usize>()
    }
}

/// Read-only knob catalog. May be empty when no baseline is known.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<KnobMeta>", into = "Vec<KnobMeta>")]
pub struct KnobCatalog {
    knobs: Vec<KnobMeta>,
    index: HashMap<String, usize>,
}

impl KnobCatalog {
    /// Build a catalog, rejecting duplicate knob names.
    pub fn new(knobs: Vec<KnobMeta>) -> Result<Self> {
        let mut index = HashMap::with_capacity(knobs.len());
        for (i, knob) in knobs.iter().enumerate() {
            if index.insert(knob.knob_name.clone(), i).is_some() {
                return Err(RecipeError::InvalidSeed(format!(
                    "duplicate knob name {}",
                    knob.knob_name
                )));
            }
        }
        Ok(Self { knobs, index })
    }

    pub fn get(&self, knob_name: &str) -> Option<&KnobMeta> {
        self.index.get(knob_name).map(|&i| &self.knobs[i])
    }

    pub fn contains(&self, knob_name: &str) -> bool {
        self.index.contains_key(knob_name)
    }

    pub fn knobs(&self) -> &[KnobMeta] {
        &self.knobs
    }

    pub fn len(&self) -> usize {
        self.knobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knobs.is_empty()
    }

    /// Knobs whose name, category path or current value contains `term`.
    pub fn search(&self, term: &str) -> Vec<&KnobMeta> {
        if term.is_empty() {
            return self.knobs.iter().collect();
        }
        let lower = term.to_lowercase();
        self.knobs
            .iter()
            .filter(|k| {
                k.knob_name.to_lowercase().contains(&lower)
                    || k.category_path.to_lowercase().contains(&lower)
                    || k.current_value.to_lowercase().contains(&lower)
            })
            .collect()
    }

    /// Group knobs into folders by their `/`-separated category path.
    pub fn category_tree(&self) -> CategoryNode {
        let mut root = CategoryNode {
            name: "Root".to_string(),
            ..CategoryNode::default()
        };
        for knob in &self.knobs {
            let mut node = &mut root;
            let mut path = String::new();
            for part in knob.category_path.split('/') {
                if !path.is_empty() {
                    path.push('/');
                }
                path.push_str(part);
                node = node
                    .children
                    .entry(part.to_string())
                    .or_insert_with(|| CategoryNode {
                        name: part.to_string(),
                        full_path: path.clone(),
                        ..CategoryNode::default()
                    });
            }
            node.knobs.push(knob.knob_name.clone());
        }
        root
    }
}

impl TryFrom<Vec<KnobMeta>> for KnobCatalog {
    type Error = RecipeError;

    fn try_from(knobs: Vec<KnobMeta>) -> Result<Self> {
        Self::new(knobs)
    }
}

impl From<KnobCatalog> for Vec<KnobMeta> {
    fn from(catalog: KnobCatalog) -> Self {
        catalog.knobs
    }
}
