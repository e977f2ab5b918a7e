//! Domain-level error taxonomy for recipe-stage.

/// Errors produced while loading a knob catalog entry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KnobMetaError {
    #[error("knob name must not be empty")]
    EmptyName,

    #[error("knob {knob} has a malformed hex bound {field}: {value}")]
    MalformedBound {
        knob: String,
        field: &'static str,
        value: String,
    },

    #[error("oneof knob {knob} declares no options")]
    MissingOptions { knob: String },
}

/// recipe-stage domain errors.
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("component type not found: {0}")]
    TypeNotFound(String),

    #[error("ingredient not found: {0}")]
    IngredientNotFound(String),

    #[error("version {version} not found in ingredient {ingredient}")]
    VersionNotFound { ingredient: String, version: String },

    #[error("component type {0} has no ingredient bound")]
    TypeNotBound(String),

    #[error("workflow step not found: {0}")]
    StepNotFound(String),

    #[error("staging requires an open editing session")]
    EditingNotOpen,

    #[error("invalid display order: {0}")]
    InvalidOrder(String),

    #[error("knob name must not be empty")]
    EmptyKnobName,

    #[error("invalid session seed: {0}")]
    InvalidSeed(String),

    #[error("invalid knob metadata: {0}")]
    InvalidKnobMeta(#[from] KnobMetaError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for recipe-stage domain operations.
pub type Result<T> = std::result::Result<T, RecipeError>;
