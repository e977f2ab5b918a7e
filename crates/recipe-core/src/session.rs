//! Session aggregate.
//!
//! A [`Session`] owns one ingredient catalog, one knob catalog, the baseline
//! override map, the workflow steps, the staging store and the override
//! store. Every mutation goes through it so that identifiers are checked
//! once and events are logged in one place.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bulk::parse_bulk;
use crate::domain::catalog::{Ingredient, IngredientCatalog, UploadEntry, Version};
use crate::domain::component::{ChangeType, ComponentSeed, ComponentType};
use crate::domain::error::{RecipeError, Result};
use crate::domain::knob::{KnobCatalog, KnobMeta};
use crate::domain::step::WorkflowStep;
use crate::filter::{filter_overrides, CountsMemo, FilterCounts, OverrideFilter, OverrideRow};
use crate::metrics::METRICS;
use crate::obs;
use crate::overrides::{OverrideMap, OverrideStore};
use crate::staging::{BatchSummary, DependencyStagingStore, StageOutcome, UploadOutcome};
use crate::validation::{KnobValidation, KnobValidator};

/// Everything needed to start a session, as loaded from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSeed {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub types: Vec<ComponentSeed>,
    #[serde(default)]
    pub knobs: Vec<KnobMeta>,
    #[serde(default)]
    pub baseline_overrides: OverrideMap,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub step_overrides: BTreeMap<String, OverrideMap>,
}

/// A component type with its derived classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentView {
    #[serde(flatten)]
    pub record: ComponentType,
    pub change_type: ChangeType,
}

impl From<&ComponentType> for ComponentView {
    fn from(record: &ComponentType) -> Self {
        Self {
            change_type: record.change_type(),
            record: record.clone(),
        }
    }
}

/// Immutable, serializable copy of a session's state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub editing: bool,
    /// In display order.
    pub types: Vec<ComponentView>,
    pub pending_change_count: usize,
    pub has_user_modifications: bool,
    pub step_overrides: BTreeMap<String, OverrideMap>,
}

#[derive(Debug)]
pub struct Session {
    id: String,
    ingredients: IngredientCatalog,
    knobs: KnobCatalog,
    baseline: OverrideMap,
    steps: Vec<WorkflowStep>,
    staging: DependencyStagingStore,
    overrides: OverrideStore,
    counts: Mutex<BTreeMap<String, CountsMemo>>,
}

impl Session {
    /// Validate a seed and build a session from it.
    pub fn from_seed(seed: SessionSeed) -> Result<Self> {
        let ingredients = IngredientCatalog::new(seed.ingredients)?;
        let knobs = KnobCatalog::new(seed.knobs)?;

        let mut step_ids = HashSet::new();
        for step in &seed.steps {
            if !step_ids.insert(step.id.as_str()) {
                return Err(RecipeError::InvalidSeed(format!(
                    "duplicate step id {}",
                    step.id
                )));
            }
        }

        for ty in &seed.types {
            if let (Some(ingredient_id), Some(version_id)) =
                (&ty.current.ingredient_id, &ty.current.version_id)
            {
                ingredients
                    .require_version(ingredient_id, version_id)
                    .map_err(|err| RecipeError::InvalidSeed(format!("type {}: {}", ty.id, err)))?;
            }
        }
        let staging = DependencyStagingStore::from_seeds(seed.types)?;

        let mut overrides = OverrideStore::new();
        for (step_id, map) in seed.step_overrides {
            if !step_ids.contains(step_id.as_str()) {
                return Err(RecipeError::InvalidSeed(format!(
                    "overrides given for unknown step {}",
                    step_id
                )));
            }
            overrides.replace(&step_id, map)?;
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            ingredients,
            knobs,
            baseline: seed.baseline_overrides,
            steps: seed.steps,
            staging,
            overrides,
            counts: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn from_seed_json(json: &str) -> Result<Self> {
        let seed: SessionSeed = serde_json::from_str(json)?;
        Self::from_seed(seed)
    }

    pub fn from_seed_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_seed_json(&json)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    // ---- reads ----

    pub fn ingredients(&self) -> &IngredientCatalog {
        &self.ingredients
    }

    pub fn knobs(&self) -> &KnobCatalog {
        &self.knobs
    }

    pub fn baseline(&self) -> &OverrideMap {
        &self.baseline
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn step(&self, step_id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    fn require_step(&self, step_id: &str) -> Result<&WorkflowStep> {
        self.step(step_id)
            .ok_or_else(|| RecipeError::StepNotFound(step_id.to_string()))
    }

    pub fn staging(&self) -> &DependencyStagingStore {
        &self.staging
    }

    pub fn component(&self, type_id: &str) -> Option<&ComponentType> {
        self.staging.get(type_id)
    }

    pub fn validator(&self) -> KnobValidator<'_> {
        KnobValidator::new(&self.knobs, &self.baseline)
    }

    /// Current override map of a step; empty if nothing was written yet.
    pub fn overrides(&self, step_id: &str) -> Result<OverrideMap> {
        self.require_step(step_id)?;
        Ok(self.overrides.overrides(step_id))
    }

    pub fn validate(&self, knob_name: &str, raw: &str) -> KnobValidation {
        self.validator().validate(knob_name, raw)
    }

    pub fn override_rows(
        &self,
        step_id: &str,
        filter: OverrideFilter,
        search: &str,
    ) -> Result<Vec<OverrideRow>> {
        let overrides = self.overrides(step_id)?;
        Ok(filter_overrides(&overrides, &self.validator(), filter, search))
    }

    /// Badge counts for a step, memoized per step by content digest.
    pub fn override_counts(&self, step_id: &str) -> Result<FilterCounts> {
        let overrides = self.overrides(step_id)?;
        let validator = self.validator();
        let mut memos = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        memos
            .entry(step_id.to_string())
            .or_default()
            .get_or_compute(&overrides, &validator, &self.baseline)
    }

    /// Lookups answered from the counts memo across all steps.
    pub fn counts_memo_hits(&self) -> u64 {
        let memos = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        memos.values().map(CountsMemo::hits).sum()
    }

    pub fn search_ingredients(&self, term: &str) -> Vec<&Ingredient> {
        self.ingredients.search(term)
    }

    pub fn search_versions(&self, ingredient_id: &str, term: &str) -> Result<Vec<&Version>> {
        Ok(self.ingredients.require(ingredient_id)?.search_versions(term))
    }

    pub fn custom_uploads(&self, term: &str) -> Vec<UploadEntry<'_>> {
        self.ingredients.custom_uploads(term)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            editing: self.staging.is_editing(),
            types: self
                .staging
                .ordered()
                .into_iter()
                .map(ComponentView::from)
                .collect(),
            pending_change_count: self.staging.pending_change_count(),
            has_user_modifications: self.staging.has_user_modifications(),
            step_overrides: self
                .overrides
                .steps()
                .map(|(step, map)| (step.clone(), map.clone()))
                .collect(),
        }
    }

    // ---- staging ----

    pub fn open_for_editing(&mut self) -> usize {
        self.staging.open_for_editing()
    }

    pub fn stage_ingredient_and_version(
        &mut self,
        type_id: &str,
        ingredient_id: &str,
        version_id: &str,
    ) -> Result<StageOutcome> {
        self.staging
            .stage_ingredient_and_version(&self.ingredients, type_id, ingredient_id, version_id)
    }

    pub fn stage_version(&mut self, type_id: &str, version_id: &str) -> Result<StageOutcome> {
        self.staging
            .stage_version(&self.ingredients, type_id, version_id)
    }

    pub fn select_version_by_string(
        &mut self,
        type_id: &str,
        version_string: &str,
    ) -> Result<StageOutcome> {
        self.staging
            .select_version_by_string(&self.ingredients, type_id, version_string)
    }

    pub fn register_custom_upload(
        &mut self,
        type_id: &str,
        ingredient_id: &str,
        version_string: &str,
        description: Option<String>,
    ) -> Result<UploadOutcome> {
        self.staging.register_custom_upload(
            &mut self.ingredients,
            type_id,
            ingredient_id,
            version_string,
            description,
        )
    }

    pub fn discard_staged(&mut self, type_id: &str) -> Result<StageOutcome> {
        self.staging.discard_staged(type_id)
    }

    pub fn commit_all(&mut self) -> BatchSummary {
        self.staging.commit_all()
    }

    pub fn revert_type(&mut self, type_id: &str) -> Result<StageOutcome> {
        self.staging.revert_type(type_id)
    }

    pub fn revert_all(&mut self) -> BatchSummary {
        self.staging.revert_all()
    }

    pub fn apply_inline_version_change(
        &mut self,
        type_id: &str,
        version_id: &str,
    ) -> Result<StageOutcome> {
        self.staging
            .apply_inline_version_change(&self.ingredients, type_id, version_id)
    }

    pub fn toggle_pin(&mut self, type_id: &str) -> Result<StageOutcome> {
        self.staging.toggle_pin(type_id)
    }

    pub fn reorder(&mut self, sequence: &[String]) -> Result<BatchSummary> {
        self.staging.reorder(sequence)
    }

    pub fn move_type(&mut self, dragged_id: &str, target_id: &str) -> Result<BatchSummary> {
        self.staging.move_type(dragged_id, target_id)
    }

    // ---- overrides ----

    /// Write one override and return its validation. Warnings never block
    /// the write.
    pub fn set_override(&mut self, step_id: &str, key: &str, value: &str) -> Result<KnobValidation> {
        self.require_step(step_id)?;
        self.overrides.set(step_id, key, value)?;
        obs::emit_overrides_written(step_id, 1);
        METRICS.add_override_writes(1);
        Ok(self.validate(key, value))
    }

    pub fn remove_override(&mut self, step_id: &str, key: &str) -> Result<Option<String>> {
        self.require_step(step_id)?;
        Ok(self.overrides.remove(step_id, key))
    }

    pub fn replace_overrides(&mut self, step_id: &str, overrides: OverrideMap) -> Result<()> {
        self.require_step(step_id)?;
        let keys = overrides.len();
        self.overrides.replace(step_id, overrides)?;
        obs::emit_overrides_written(step_id, keys);
        METRICS.add_override_writes(keys as u64);
        Ok(())
    }

    /// Parse bulk text and merge it into a step. Returns the parsed
    /// fragment.
    pub fn import_bulk(&mut self, step_id: &str, text: &str) -> Result<OverrideMap> {
        self.require_step(step_id)?;
        let fragment = parse_bulk(text);
        let warnings = {
            let validator = self.validator();
            fragment
                .iter()
                .filter(|(key, value)| validator.validate(key, value).is_warning())
                .count()
        };
        let written = self.overrides.merge(step_id, &fragment);
        obs::emit_bulk_imported(step_id, written, warnings);
        METRICS.add_override_writes(written as u64);
        Ok(fragment)
    }

    /// Shallow-merge `fragment` into every target step. No step is touched
    /// unless all targets exist and every fragment key is a knob name.
    pub fn copy_overrides(&mut self, fragment: &OverrideMap, targets: &[String]) -> Result<usize> {
        if fragment.keys().any(|key| key.trim().is_empty()) {
            return Err(RecipeError::EmptyKnobName);
        }
        for target in targets {
            self.require_step(target)?;
        }
        let written = self.overrides.copy(fragment, targets);
        obs::emit_overrides_copied(fragment.len(), targets.len());
        METRICS.add_override_writes(written as u64);
        Ok(written)
    }

    /// Copy the listed keys of `source_step_id` to every target. Keys the
    /// source does not have are ignored. Returns the copied fragment.
    pub fn copy_selected_overrides(
        &mut self,
        source_step_id: &str,
        keys: &[String],
        targets: &[String],
    ) -> Result<OverrideMap> {
        let source = self.overrides(source_step_id)?;
        let fragment: OverrideMap = keys
            .iter()
            .filter_map(|key| source.get(key).map(|value| (key.clone(), value.clone())))
            .collect();
        self.copy_overrides(&fragment, targets)?;
        Ok(fragment)
    }

    /// Remove the knob if the step overrides it, otherwise add it with the
    /// catalog's current value (empty for unknown knobs). Returns the value
    /// written, or `None` when the knob was removed.
    pub fn toggle_knob(&mut self, step_id: &str, knob_name: &str) -> Result<Option<String>> {
        self.require_step(step_id)?;
        if self.overrides.remove(step_id, knob_name).is_some() {
            return Ok(None);
        }
        let value = self
            .knobs
            .get(knob_name)
            .map(|meta| meta.current_value.clone())
            .unwrap_or_default();
        self.overrides.set(step_id, knob_name, &value)?;
        obs::emit_overrides_written(step_id, 1);
        METRICS.add_override_writes(1);
        Ok(Some(value))
    }

    /// Write the baseline value for a knob. With no baseline the key is
    /// removed instead. Returns the value written.
    pub fn revert_to_baseline(&mut self, step_id: &str, knob_name: &str) -> Result<Option<String>> {
        self.require_step(step_id)?;
        let baseline = self
            .validator()
            .baseline_value(knob_name)
            .map(str::to_string);
        match &baseline {
            Some(value) => {
                self.overrides.set(step_id, knob_name, value)?;
                obs::emit_overrides_written(step_id, 1);
                METRICS.add_override_writes(1);
            }
            None => {
                self.overrides.remove(step_id, knob_name);
            }
        }
        Ok(baseline)
    }
}
