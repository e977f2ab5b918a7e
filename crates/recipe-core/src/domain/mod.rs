//! Domain models for recipe-stage.
//!
//! Canonical definitions for the core entities:
//! - `Ingredient` / `Version`: versioned artifacts and their releases
//! - `ComponentType`: a build slot with its current/staged/original bindings
//! - `KnobMeta`: metadata for one known build parameter
//! - `WorkflowStep`: the owner of a set of knob overrides

pub mod catalog;
pub mod component;
pub mod digest;
pub mod error;
pub mod knob;
pub mod step;

// Re-export main types and errors
pub use catalog::{Ingredient, IngredientCatalog, UploadEntry, Version, USER_UPLOAD};
pub use component::{
    Binding, Category, ChangeIntent, ChangeType, ComponentSeed, ComponentStatus, ComponentType,
    Source,
};
pub use error::{KnobMetaError, RecipeError, Result};
pub use knob::{
    parse_hex, CategoryNode, HexValue, KnobCatalog, KnobKind, KnobMeta, KnobMetaRecord,
    KnobOption, KnobTypeTag,
};
pub use step::{Stage, StepStatus, WorkflowStep};
