//! Dependency staging store.
//!
//! Holds every [`ComponentType`] record and applies the staging lifecycle:
//! open → stage → commit, with single-type and bulk revert. Classification
//! is never written here; each record derives it from its pending intent.
//!
//! # Invariants
//!
//! - Locked records are never mutated. Every operation targeting one
//!   returns [`StageOutcome::SkippedLocked`] rather than an error, so bulk
//!   operations over mixed lists always succeed.
//! - Commit copies staged → current but leaves `original` alone; only a
//!   revert moves `source` back to `Baseline`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::classify::version_selection_intent;
use crate::domain::catalog::{IngredientCatalog, Version};
use crate::domain::component::{
    Binding, ChangeIntent, ComponentSeed, ComponentStatus, ComponentType, Source,
};
use crate::domain::error::{RecipeError, Result};
use crate::metrics::METRICS;
use crate::obs;

/// Result of a single-record mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Applied,
    SkippedLocked,
}

/// Result of a mutation applied across many records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: Vec<String>,
    pub skipped_locked: Vec<String>,
}

impl BatchSummary {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// A custom upload after registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadOutcome {
    pub outcome: StageOutcome,
    /// The new catalog version; `None` when the target type was locked.
    pub version: Option<Version>,
}

/// Owner of all component-type records for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStagingStore {
    types: Vec<ComponentType>,
    editing: bool,
}

impl DependencyStagingStore {
    /// Build a store, rejecting duplicate ids and locked records with
    /// bindings.
    pub fn new(types: Vec<ComponentType>) -> Result<Self> {
        let mut seen = HashSet::new();
        for record in &types {
            if !seen.insert(record.id.as_str()) {
                return Err(RecipeError::InvalidSeed(format!(
                    "duplicate component type id {}",
                    record.id
                )));
            }
            if record.is_locked()
                && !(record.current.is_unbound()
                    && record.staged.is_unbound()
                    && record.original.is_unbound())
            {
                return Err(RecipeError::InvalidSeed(format!(
                    "locked component type {} must not carry a binding",
                    record.id
                )));
            }
        }
        Ok(Self {
            types,
            editing: false,
        })
    }

    pub fn from_seeds(seeds: Vec<ComponentSeed>) -> Result<Self> {
        Self::new(seeds.into_iter().map(ComponentType::from_seed).collect())
    }

    pub fn types(&self) -> &[ComponentType] {
        &self.types
    }

    pub fn get(&self, type_id: &str) -> Option<&ComponentType> {
        self.types.iter().find(|t| t.id == type_id)
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    fn record_mut(&mut self, type_id: &str) -> Result<&mut ComponentType> {
        self.types
            .iter_mut()
            .find(|t| t.id == type_id)
            .ok_or_else(|| RecipeError::TypeNotFound(type_id.to_string()))
    }

    fn require_editing(&self) -> Result<()> {
        if self.editing {
            Ok(())
        } else {
            Err(RecipeError::EditingNotOpen)
        }
    }

    fn record(&self, type_id: &str) -> Result<&ComponentType> {
        self.get(type_id)
            .ok_or_else(|| RecipeError::TypeNotFound(type_id.to_string()))
    }

    /// `Some(SkippedLocked)` when the record is locked.
    fn locked_guard(&self, type_id: &str, operation: &str) -> Result<Option<StageOutcome>> {
        if self.record(type_id)?.is_locked() {
            obs::emit_locked_skip(type_id, operation);
            METRICS.inc_locked_skips();
            return Ok(Some(StageOutcome::SkippedLocked));
        }
        Ok(None)
    }

    /// Snapshot every unlocked record's current binding into staged and
    /// original, establishing the revert baseline for this editing session.
    pub fn open_for_editing(&mut self) -> usize {
        let mut opened = 0;
        for record in self.types.iter_mut().filter(|t| !t.is_locked()) {
            record.staged = record.current.clone();
            record.original = record.current.clone();
            record.pending_intent = None;
            opened += 1;
        }
        self.editing = true;
        obs::emit_editing_opened(opened);
        opened
    }

    fn stage_binding(
        &mut self,
        type_id: &str,
        binding: Binding,
        intent: ChangeIntent,
    ) -> Result<StageOutcome> {
        let record = self.record_mut(type_id)?;
        record.staged = binding;
        record.status = ComponentStatus::Configured;
        record.pending_intent = Some(intent);
        let change_type = record.change_type();
        obs::emit_staged(type_id, change_type);
        METRICS.inc_stagings();
        Ok(StageOutcome::Applied)
    }

    /// Stage a new ingredient + version pair as an ingredient-level change.
    pub fn stage_ingredient_and_version(
        &mut self,
        catalog: &IngredientCatalog,
        type_id: &str,
        ingredient_id: &str,
        version_id: &str,
    ) -> Result<StageOutcome> {
        self.require_editing()?;
        if let Some(skipped) = self.locked_guard(type_id, "stage_ingredient_and_version")? {
            return Ok(skipped);
        }
        catalog.require_version(ingredient_id, version_id)?;
        self.stage_binding(
            type_id,
            Binding::new(ingredient_id, version_id),
            ChangeIntent::IngredientChange,
        )
    }

    /// Stage a different version of the staged ingredient.
    pub fn stage_version(
        &mut self,
        catalog: &IngredientCatalog,
        type_id: &str,
        version_id: &str,
    ) -> Result<StageOutcome> {
        self.require_editing()?;
        if let Some(skipped) = self.locked_guard(type_id, "stage_version")? {
            return Ok(skipped);
        }
        let record = self.record(type_id)?;
        let ingredient_id = record
            .staged
            .ingredient_id
            .clone()
            .ok_or_else(|| RecipeError::TypeNotBound(type_id.to_string()))?;
        catalog.require_version(&ingredient_id, version_id)?;
        let intent = version_selection_intent(record.pending_intent);

        let record = self.record_mut(type_id)?;
        record.staged.version_id = Some(version_id.to_string());
        record.pending_intent = Some(intent);
        let change_type = record.change_type();
        obs::emit_staged(type_id, change_type);
        METRICS.inc_stagings();
        Ok(StageOutcome::Applied)
    }

    /// Stage the staged ingredient's version whose version string matches.
    /// This is the upload path when no payload accompanies the request.
    pub fn select_version_by_string(
        &mut self,
        catalog: &IngredientCatalog,
        type_id: &str,
        version_string: &str,
    ) -> Result<StageOutcome> {
        self.require_editing()?;
        if let Some(skipped) = self.locked_guard(type_id, "select_version_by_string")? {
            return Ok(skipped);
        }
        let ingredient_id = self
            .record(type_id)?
            .staged
            .ingredient_id
            .clone()
            .ok_or_else(|| RecipeError::TypeNotBound(type_id.to_string()))?;
        let version_id = catalog
            .require(&ingredient_id)?
            .version_by_string(version_string)
            .map(|v| v.id.clone())
            .ok_or_else(|| RecipeError::VersionNotFound {
                ingredient: ingredient_id.clone(),
                version: version_string.to_string(),
            })?;
        self.stage_version(catalog, type_id, &version_id)
    }

    /// Prepend a user-uploaded version to `ingredient_id` and stage it on
    /// the type as a custom upload. Locked types leave the catalog untouched.
    pub fn register_custom_upload(
        &mut self,
        catalog: &mut IngredientCatalog,
        type_id: &str,
        ingredient_id: &str,
        version_string: &str,
        description: Option<String>,
    ) -> Result<UploadOutcome> {
        self.require_editing()?;
        if let Some(outcome) = self.locked_guard(type_id, "register_custom_upload")? {
            return Ok(UploadOutcome {
                outcome,
                version: None,
            });
        }
        let version = catalog
            .prepend_version(ingredient_id, Version::custom_upload(version_string, description))?
            .clone();
        obs::emit_upload_registered(ingredient_id, &version.id, &version.version_string);
        let outcome = self.stage_binding(
            type_id,
            Binding::new(ingredient_id, version.id.clone()),
            ChangeIntent::CustomUpload,
        )?;
        Ok(UploadOutcome {
            outcome,
            version: Some(version),
        })
    }

    /// Drop the staged binding of one type, restoring its original pair.
    /// Current binding and source are untouched.
    pub fn discard_staged(&mut self, type_id: &str) -> Result<StageOutcome> {
        if let Some(skipped) = self.locked_guard(type_id, "discard_staged")? {
            return Ok(skipped);
        }
        let record = self.record_mut(type_id)?;
        record.staged = record.original.clone();
        record.status = record.status_from_original();
        record.pending_intent = None;
        Ok(StageOutcome::Applied)
    }

    /// Fold every pending change into the current binding.
    pub fn commit_all(&mut self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for record in self.types.iter_mut().filter(|t| t.has_pending_change()) {
            record.current = record.staged.clone();
            record.source = Source::User;
            record.pending_intent = None;
            summary.applied.push(record.id.clone());
        }
        obs::emit_committed(summary.applied.len());
        METRICS.add_commits(summary.applied.len() as u64);
        summary
    }

    fn revert_record(record: &mut ComponentType) {
        record.current = record.original.clone();
        record.staged = record.original.clone();
        record.pending_intent = None;
        record.source = Source::Baseline;
        record.status = record.status_from_original();
    }

    pub fn revert_type(&mut self, type_id: &str) -> Result<StageOutcome> {
        if let Some(skipped) = self.locked_guard(type_id, "revert_type")? {
            return Ok(skipped);
        }
        Self::revert_record(self.record_mut(type_id)?);
        obs::emit_reverted(type_id, 1);
        METRICS.add_reverts(1);
        Ok(StageOutcome::Applied)
    }

    pub fn revert_all(&mut self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for record in self.types.iter_mut() {
            if record.is_locked() {
                summary.skipped_locked.push(record.id.clone());
                continue;
            }
            Self::revert_record(record);
            summary.applied.push(record.id.clone());
        }
        obs::emit_reverted("all", summary.applied.len());
        METRICS.add_reverts(summary.applied.len() as u64);
        summary
    }

    /// Direct, already-committed version edit outside the staging flow.
    /// Sets current, staged and original version at once; intent stays
    /// clear.
    pub fn apply_inline_version_change(
        &mut self,
        catalog: &IngredientCatalog,
        type_id: &str,
        version_id: &str,
    ) -> Result<StageOutcome> {
        if let Some(skipped) = self.locked_guard(type_id, "apply_inline_version_change")? {
            return Ok(skipped);
        }
        let ingredient_id = self
            .record(type_id)?
            .current
            .ingredient_id
            .clone()
            .ok_or_else(|| RecipeError::TypeNotBound(type_id.to_string()))?;
        catalog.require_version(&ingredient_id, version_id)?;

        let record = self.record_mut(type_id)?;
        record.current.version_id = Some(version_id.to_string());
        record.staged.version_id = Some(version_id.to_string());
        record.original.version_id = Some(version_id.to_string());
        record.source = Source::User;
        Ok(StageOutcome::Applied)
    }

    pub fn toggle_pin(&mut self, type_id: &str) -> Result<StageOutcome> {
        if let Some(skipped) = self.locked_guard(type_id, "toggle_pin")? {
            return Ok(skipped);
        }
        let record = self.record_mut(type_id)?;
        record.is_pinned = !record.is_pinned;
        Ok(StageOutcome::Applied)
    }

    /// Assign display order from `sequence`, which must list every type id
    /// exactly once. Locked types keep their order value, so their place in
    /// `sequence` is ignored; the other types take the free slots in
    /// sequence order.
    pub fn reorder(&mut self, sequence: &[String]) -> Result<BatchSummary> {
        if sequence.len() != self.types.len() {
            return Err(RecipeError::InvalidOrder(format!(
                "expected {} type ids, got {}",
                self.types.len(),
                sequence.len()
            )));
        }
        let mut seen = HashSet::new();
        for id in sequence {
            if !seen.insert(id.as_str()) {
                return Err(RecipeError::InvalidOrder(format!("duplicate type id {}", id)));
            }
            self.record(id)?;
        }

        let held: HashSet<u32> = self
            .types
            .iter()
            .filter(|t| t.is_locked())
            .map(|t| t.order)
            .collect();
        let mut free_slots = (0u32..).filter(|slot| !held.contains(slot));

        let mut summary = BatchSummary::default();
        for id in sequence {
            let record = self.record_mut(id)?;
            if record.is_locked() {
                summary.skipped_locked.push(id.clone());
                continue;
            }
            if let Some(slot) = free_slots.next() {
                record.order = slot;
            }
            summary.applied.push(id.clone());
        }
        Ok(summary)
    }

    /// Move `dragged_id` to the slot currently held by `target_id` in the
    /// display order, shifting the records in between.
    pub fn move_type(&mut self, dragged_id: &str, target_id: &str) -> Result<BatchSummary> {
        let mut sequence: Vec<String> = self.ordered().iter().map(|t| t.id.clone()).collect();
        let from = sequence
            .iter()
            .position(|id| id == dragged_id)
            .ok_or_else(|| RecipeError::TypeNotFound(dragged_id.to_string()))?;
        let to = sequence
            .iter()
            .position(|id| id == target_id)
            .ok_or_else(|| RecipeError::TypeNotFound(target_id.to_string()))?;
        if from == to {
            return Ok(BatchSummary::default());
        }
        let moved = sequence.remove(from);
        sequence.insert(to, moved);
        self.reorder(&sequence)
    }

    /// Records sorted by display order; ties keep seed order.
    pub fn ordered(&self) -> Vec<&ComponentType> {
        let mut ordered: Vec<_> = self.types.iter().collect();
        ordered.sort_by_key(|t| t.order);
        ordered
    }

    pub fn pinned(&self) -> Vec<&ComponentType> {
        self.ordered().into_iter().filter(|t| t.is_pinned).collect()
    }

    pub fn unpinned(&self) -> Vec<&ComponentType> {
        self.ordered().into_iter().filter(|t| !t.is_pinned).collect()
    }

    /// Number of records with a staged change awaiting commit.
    pub fn pending_change_count(&self) -> usize {
        self.types.iter().filter(|t| t.has_pending_change()).count()
    }

    /// Whether any committed binding came from the user.
    pub fn has_user_modifications(&self) -> bool {
        self.types.iter().any(|t| t.source == Source::User)
    }
}
