//! Serializable session commands.
//!
//! [`SessionCommand`] is the wire form of every [`Session`] mutation. A JSON
//! script of commands can be replayed against a seed with
//! [`Session::execute_all`]; each command runs inside a [`SessionSpan`].

use serde::{Deserialize, Serialize};

use crate::domain::catalog::Version;
use crate::domain::component::ChangeType;
use crate::domain::error::Result;
use crate::metrics::METRICS;
use crate::obs::SessionSpan;
use crate::overrides::OverrideMap;
use crate::session::Session;
use crate::staging::{BatchSummary, StageOutcome};
use crate::validation::KnobValidation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionCommand {
    OpenForEditing,
    StageIngredientAndVersion {
        type_id: String,
        ingredient_id: String,
        version_id: String,
    },
    StageVersion {
        type_id: String,
        version_id: String,
    },
    SelectVersionByString {
        type_id: String,
        version_string: String,
    },
    RegisterCustomUpload {
        type_id: String,
        ingredient_id: String,
        version_string: String,
        #[serde(default)]
        description: Option<String>,
    },
    DiscardStaged {
        type_id: String,
    },
    CommitAll,
    RevertType {
        type_id: String,
    },
    RevertAll,
    ApplyInlineVersionChange {
        type_id: String,
        version_id: String,
    },
    TogglePin {
        type_id: String,
    },
    Reorder {
        sequence: Vec<String>,
    },
    MoveType {
        dragged_id: String,
        target_id: String,
    },
    SetOverride {
        step_id: String,
        key: String,
        value: String,
    },
    RemoveOverride {
        step_id: String,
        key: String,
    },
    ReplaceOverrides {
        step_id: String,
        overrides: OverrideMap,
    },
    ImportBulk {
        step_id: String,
        text: String,
    },
    CopyOverrides {
        fragment: OverrideMap,
        targets: Vec<String>,
    },
    CopySelectedOverrides {
        source_step_id: String,
        keys: Vec<String>,
        targets: Vec<String>,
    },
    ToggleKnob {
        step_id: String,
        knob_name: String,
    },
    RevertToBaseline {
        step_id: String,
        knob_name: String,
    },
}

impl SessionCommand {
    /// Operation name, as used in the `op` tag and span fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenForEditing => "open_for_editing",
            Self::StageIngredientAndVersion { .. } => "stage_ingredient_and_version",
            Self::StageVersion { .. } => "stage_version",
            Self::SelectVersionByString { .. } => "select_version_by_string",
            Self::RegisterCustomUpload { .. } => "register_custom_upload",
            Self::DiscardStaged { .. } => "discard_staged",
            Self::CommitAll => "commit_all",
            Self::RevertType { .. } => "revert_type",
            Self::RevertAll => "revert_all",
            Self::ApplyInlineVersionChange { .. } => "apply_inline_version_change",
            Self::TogglePin { .. } => "toggle_pin",
            Self::Reorder { .. } => "reorder",
            Self::MoveType { .. } => "move_type",
            Self::SetOverride { .. } => "set_override",
            Self::RemoveOverride { .. } => "remove_override",
            Self::ReplaceOverrides { .. } => "replace_overrides",
            Self::ImportBulk { .. } => "import_bulk",
            Self::CopyOverrides { .. } => "copy_overrides",
            Self::CopySelectedOverrides { .. } => "copy_selected_overrides",
            Self::ToggleKnob { .. } => "toggle_knob",
            Self::RevertToBaseline { .. } => "revert_to_baseline",
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandOutcome {
    Opened {
        types: usize,
    },
    Staged {
        type_id: String,
        outcome: StageOutcome,
        change_type: ChangeType,
    },
    Uploaded {
        type_id: String,
        outcome: StageOutcome,
        version: Option<Version>,
    },
    Updated {
        type_id: String,
        outcome: StageOutcome,
    },
    Committed(BatchSummary),
    Reverted(BatchSummary),
    Reordered(BatchSummary),
    OverrideWritten {
        step_id: String,
        key: String,
        validation: KnobValidation,
    },
    OverrideRemoved {
        step_id: String,
        key: String,
        previous: Option<String>,
    },
    OverridesReplaced {
        step_id: String,
        keys: usize,
    },
    BulkImported {
        step_id: String,
        fragment: OverrideMap,
    },
    Copied {
        fragment: OverrideMap,
        targets: Vec<String>,
    },
    /// `value` is `None` when the knob was removed.
    KnobToggled {
        step_id: String,
        knob_name: String,
        value: Option<String>,
    },
    RevertedToBaseline {
        step_id: String,
        knob_name: String,
        value: Option<String>,
    },
}

impl Session {
    fn staged(&self, type_id: String, outcome: StageOutcome) -> CommandOutcome {
        let change_type = self
            .component(&type_id)
            .map(|t| t.change_type())
            .unwrap_or_default();
        CommandOutcome::Staged {
            type_id,
            outcome,
            change_type,
        }
    }

    /// Run one command. Failed commands leave the session unchanged.
    pub fn execute(&mut self, command: SessionCommand) -> Result<CommandOutcome> {
        let session_id = self.id().to_string();
        let _span = SessionSpan::enter(&session_id, command.name());
        METRICS.inc_commands();

        let outcome = match command {
            SessionCommand::OpenForEditing => CommandOutcome::Opened {
                types: self.open_for_editing(),
            },
            SessionCommand::StageIngredientAndVersion {
                type_id,
                ingredient_id,
                version_id,
            } => {
                let outcome =
                    self.stage_ingredient_and_version(&type_id, &ingredient_id, &version_id)?;
                self.staged(type_id, outcome)
            }
            SessionCommand::StageVersion {
                type_id,
                version_id,
            } => {
                let outcome = self.stage_version(&type_id, &version_id)?;
                self.staged(type_id, outcome)
            }
            SessionCommand::SelectVersionByString {
                type_id,
                version_string,
            } => {
                let outcome = self.select_version_by_string(&type_id, &version_string)?;
                self.staged(type_id, outcome)
            }
            SessionCommand::RegisterCustomUpload {
                type_id,
                ingredient_id,
                version_string,
                description,
            } => {
                let upload = self.register_custom_upload(
                    &type_id,
                    &ingredient_id,
                    &version_string,
                    description,
                )?;
                CommandOutcome::Uploaded {
                    type_id,
                    outcome: upload.outcome,
                    version: upload.version,
                }
            }
            SessionCommand::DiscardStaged { type_id } => {
                let outcome = self.discard_staged(&type_id)?;
                CommandOutcome::Updated { type_id, outcome }
            }
            SessionCommand::CommitAll => CommandOutcome::Committed(self.commit_all()),
            SessionCommand::RevertType { type_id } => {
                let outcome = self.revert_type(&type_id)?;
                CommandOutcome::Updated { type_id, outcome }
            }
            SessionCommand::RevertAll => CommandOutcome::Reverted(self.revert_all()),
            SessionCommand::ApplyInlineVersionChange {
                type_id,
                version_id,
            } => {
                let outcome = self.apply_inline_version_change(&type_id, &version_id)?;
                CommandOutcome::Updated { type_id, outcome }
            }
            SessionCommand::TogglePin { type_id } => {
                let outcome = self.toggle_pin(&type_id)?;
                CommandOutcome::Updated { type_id, outcome }
            }
            SessionCommand::Reorder { sequence } => {
                CommandOutcome::Reordered(self.reorder(&sequence)?)
            }
            SessionCommand::MoveType {
                dragged_id,
                target_id,
            } => CommandOutcome::Reordered(self.move_type(&dragged_id, &target_id)?),
            SessionCommand::SetOverride {
                step_id,
                key,
                value,
            } => {
                let validation = self.set_override(&step_id, &key, &value)?;
                CommandOutcome::OverrideWritten {
                    step_id,
                    key,
                    validation,
                }
            }
            SessionCommand::RemoveOverride { step_id, key } => {
                let previous = self.remove_override(&step_id, &key)?;
                CommandOutcome::OverrideRemoved {
                    step_id,
                    key,
                    previous,
                }
            }
            SessionCommand::ReplaceOverrides { step_id, overrides } => {
                let keys = overrides.len();
                self.replace_overrides(&step_id, overrides)?;
                CommandOutcome::OverridesReplaced { step_id, keys }
            }
            SessionCommand::ImportBulk { step_id, text } => {
                let fragment = self.import_bulk(&step_id, &text)?;
                CommandOutcome::BulkImported { step_id, fragment }
            }
            SessionCommand::CopyOverrides { fragment, targets } => {
                self.copy_overrides(&fragment, &targets)?;
                CommandOutcome::Copied { fragment, targets }
            }
            SessionCommand::CopySelectedOverrides {
                source_step_id,
                keys,
                targets,
            } => {
                let fragment = self.copy_selected_overrides(&source_step_id, &keys, &targets)?;
                CommandOutcome::Copied { fragment, targets }
            }
            SessionCommand::ToggleKnob { step_id, knob_name } => {
                let value = self.toggle_knob(&step_id, &knob_name)?;
                CommandOutcome::KnobToggled {
                    step_id,
                    knob_name,
                    value,
                }
            }
            SessionCommand::RevertToBaseline { step_id, knob_name } => {
                let value = self.revert_to_baseline(&step_id, &knob_name)?;
                CommandOutcome::RevertedToBaseline {
                    step_id,
                    knob_name,
                    value,
                }
            }
        };
        Ok(outcome)
    }

    /// Run commands in order, stopping at the first error.
    pub fn execute_all(
        &mut self,
        commands: impl IntoIterator<Item = SessionCommand>,
    ) -> Result<Vec<CommandOutcome>> {
        commands.into_iter().map(|c| self.execute(c)).collect()
    }
}
