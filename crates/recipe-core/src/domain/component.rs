//! Component type records: the triple-state (current / staged / original)
//! edit buffer for one configurable build slot.

use serde::{Deserialize, Serialize};

use crate::classify::classify;

/// Grouping bucket for display. Carries no staging semantics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    KeyIngredients,
    Standard,
    Locked,
}

/// Configuration status of a component type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentStatus {
    Configured,
    NotConfigured,
    Locked,
}

/// Where the committed binding came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    Baseline,
    User,
}

/// Derived classification of a record's staged binding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    #[default]
    None,
    VersionChange,
    IngredientChange,
    CustomUpload,
}

/// The user action that produced a staged binding.
///
/// Intent is supplied by the staging command, never inferred from the diff:
/// "changed the ingredient" and "changed only the version" are different
/// actions even when their diffs overlap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeIntent {
    VersionChange,
    IngredientChange,
    CustomUpload,
}

impl From<ChangeIntent> for ChangeType {
    fn from(intent: ChangeIntent) -> Self {
        match intent {
            ChangeIntent::VersionChange => ChangeType::VersionChange,
            ChangeIntent::IngredientChange => ChangeType::IngredientChange,
            ChangeIntent::CustomUpload => ChangeType::CustomUpload,
        }
    }
}

/// An ingredient + version pair. Either side may be unbound.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub ingredient_id: Option<String>,
    pub version_id: Option<String>,
}

impl Binding {
    pub fn new(ingredient_id: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            ingredient_id: Some(ingredient_id.into()),
            version_id: Some(version_id.into()),
        }
    }

    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn is_unbound(&self) -> bool {
        self.ingredient_id.is_none() && self.version_id.is_none()
    }
}

/// Seed form of a component type, as supplied by the catalog data source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSeed {
    pub id: String,
    pub label: String,
    pub category: Category,
    pub status: ComponentStatus,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub current: Binding,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub order: u32,
}

/// One configurable build slot and its edit buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentType {
    pub id: String,
    pub label: String,
    pub category: Category,
    pub status: ComponentStatus,
    pub source: Source,
    /// Committed binding.
    pub current: Binding,
    /// In-progress binding.
    pub staged: Binding,
    /// Revert target for the editing session.
    pub original: Binding,
    /// Intent of the last staging command; cleared by open, commit and revert.
    #[serde(default)]
    pub pending_intent: Option<ChangeIntent>,
    pub is_pinned: bool,
    pub order: u32,
}

impl ComponentType {
    /// Create a record at session start: staged and original mirror current.
    pub fn from_seed(seed: ComponentSeed) -> Self {
        Self {
            id: seed.id,
            label: seed.label,
            category: seed.category,
            status: seed.status,
            source: seed.source,
            staged: seed.current.clone(),
            original: seed.current.clone(),
            current: seed.current,
            pending_intent: None,
            is_pinned: seed.is_pinned,
            order: seed.order,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.status == ComponentStatus::Locked
    }

    /// Classification of the staged binding, derived on every read.
    pub fn change_type(&self) -> ChangeType {
        classify(&self.staged, &self.original, self.pending_intent)
    }

    pub fn has_pending_change(&self) -> bool {
        self.change_type() != ChangeType::None
    }

    /// Status implied by the original binding, used when reverting.
    pub(crate) fn status_from_original(&self) -> ComponentStatus {
        if self.original.ingredient_id.is_some() {
            ComponentStatus::Configured
        } else {
            ComponentStatus::NotConfigured
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> ComponentSeed {
        ComponentSeed {
            id: "type-ec".to_string(),
            label: "EC".to_string(),
            category: Category::KeyIngredients,
            status: ComponentStatus::Configured,
            source: Source::Baseline,
            current: Binding::new("ing-ec", "v-ec-0"),
            is_pinned: true,
            order: 0,
        }
    }

    #[test]
    fn from_seed_mirrors_current() {
        let record = ComponentType::from_seed(seed());
        assert_eq!(record.staged, record.current);
        assert_eq!(record.original, record.current);
        assert_eq!(record.change_type(), ChangeType::None);
    }

    #[test]
    fn change_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&ChangeType::IngredientChange).expect("serialize");
        assert_eq!(json, "\"INGREDIENT_CHANGE\"");
        let json = serde_json::to_string(&ComponentStatus::NotConfigured).expect("serialize");
        assert_eq!(json, "\"NOT_CONFIGURED\"");
    }

    #[test]
    fn seed_defaults_apply() {
        let json = r#"{"id":"type-pse","label":"PSE","category":"KEY_INGREDIENTS","status":"NOT_CONFIGURED"}"#;
        let seed: ComponentSeed = serde_json::from_str(json).expect("deserialize");
        assert_eq!(seed.source, Source::Baseline);
        assert!(seed.current.is_unbound());
        assert!(!seed.is_pinned);
    }

    #[test]
    fn status_from_original_tracks_ingredient() {
        let mut record = ComponentType::from_seed(seed());
        assert_eq!(record.status_from_original(), ComponentStatus::Configured);
        record.original = Binding::unbound();
        assert_eq!(record.status_from_original(), ComponentStatus::NotConfigured);
    }
}
