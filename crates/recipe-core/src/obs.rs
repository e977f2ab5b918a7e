//! Structured observability hooks for staging and override events.
//!
//! This module provides:
//! - Session-scoped tracing spans via the `SessionSpan` RAII guard
//! - One emission function per lifecycle event: open, stage, commit, revert,
//!   locked skip, upload, override write, bulk import, copy
//!
//! Events are emitted at `info!` level except locked skips (`debug!`).
//! Filtering follows `RECIPE_LOG` / `RUST_LOG` (see [`crate::telemetry`]).

use tracing::{debug, info};

use crate::domain::component::ChangeType;

/// RAII guard that enters a session-scoped span for the duration of a
/// command.
///
/// # Example
///
/// ```ignore
/// let _span = SessionSpan::enter("session-1", "commit_all");
/// // tracing calls inside carry session_id and command fields
/// ```
pub struct SessionSpan {
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    pub fn enter(session_id: &str, command: &str) -> Self {
        let span = tracing::info_span!("recipe.session", session_id = %session_id, command = %command);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: editing session opened over `types` records.
pub fn emit_editing_opened(types: usize) {
    info!(event = "staging.opened", types = types);
}

/// Emit event: a type's staged binding changed.
///
/// # Example
///
/// ```ignore
/// emit_staged("type-ec", ChangeType::VersionChange);
/// // logs: event=staging.staged type_id=type-ec change_type=VersionChange
/// ```
pub fn emit_staged(type_id: &str, change_type: ChangeType) {
    info!(event = "staging.staged", type_id = %type_id, change_type = ?change_type);
}

/// Emit event: pending changes folded into current bindings.
pub fn emit_committed(committed: usize) {
    info!(event = "staging.committed", committed = committed);
}

/// Emit event: bindings reverted to their original values.
pub fn emit_reverted(scope: &str, reverted: usize) {
    info!(event = "staging.reverted", scope = %scope, reverted = reverted);
}

/// Emit event: a mutation targeted a locked type and was skipped.
pub fn emit_locked_skip(type_id: &str, operation: &str) {
    debug!(event = "staging.locked_skip", type_id = %type_id, operation = %operation);
}

/// Emit event: a custom upload was added to the ingredient catalog.
pub fn emit_upload_registered(ingredient_id: &str, version_id: &str, version_string: &str) {
    info!(
        event = "catalog.upload_registered",
        ingredient_id = %ingredient_id,
        version_id = %version_id,
        version_string = %version_string,
    );
}

/// Emit event: override values written to a step.
pub fn emit_overrides_written(step_id: &str, keys: usize) {
    info!(event = "overrides.written", step_id = %step_id, keys = keys);
}

/// Emit event: bulk text imported into a step.
pub fn emit_bulk_imported(step_id: &str, keys: usize, warnings: usize) {
    info!(
        event = "overrides.bulk_imported",
        step_id = %step_id,
        keys = keys,
        warnings = warnings,
    );
}

/// Emit event: an override fragment copied to other steps.
pub fn emit_overrides_copied(keys: usize, targets: usize) {
    info!(event = "overrides.copied", keys = keys, targets = targets);
}
