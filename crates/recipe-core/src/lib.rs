//! Recipe Stage Core Library
//!
//! Staging, diff and validation engine for component-type → ingredient
//! bindings and per-step knob overrides.

pub mod bulk;
pub mod classify;
pub mod command;
pub mod domain;
pub mod filter;
pub mod metrics;
pub mod obs;
pub mod overrides;
pub mod session;
pub mod staging;
pub mod telemetry;
pub mod validation;

pub use domain::{
    parse_hex, Binding, Category, CategoryNode, ChangeIntent, ChangeType, ComponentSeed,
    ComponentStatus, ComponentType, HexValue, Ingredient, IngredientCatalog, KnobCatalog,
    KnobKind, KnobMeta, KnobMetaError, KnobMetaRecord, KnobOption, KnobTypeTag, RecipeError,
    Result, Source, Stage, StepStatus, UploadEntry, Version, WorkflowStep, USER_UPLOAD,
};

pub use bulk::parse_bulk;
pub use classify::{classify, version_selection_intent};
pub use command::{CommandOutcome, SessionCommand};
pub use filter::{
    count_overrides, filter_overrides, CountsMemo, FilterCounts, OverrideFilter, OverrideRow,
};
pub use overrides::{merge_into, OverrideMap, OverrideStore};
pub use session::{ComponentView, Session, SessionSeed, SessionSnapshot};
pub use staging::{BatchSummary, DependencyStagingStore, StageOutcome, UploadOutcome};
pub use validation::{
    KnobStatus, KnobValidation, KnobValidator, KnobWarning, RangeBound, REDUNDANT_MESSAGE,
};

pub use metrics::METRICS;
pub use obs::SessionSpan;
pub use telemetry::init_tracing;

/// Crate version, as recorded in the workspace manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
