//! Ingredient catalog: versioned artifacts that component types bind to.
//!
//! The catalog is read-only reference data with a single append-only
//! mutation path: custom uploads prepend a new [`Version`] to an
//! ingredient's version list.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{RecipeError, Result};

/// `released_by` marker for versions created through a custom upload.
pub const USER_UPLOAD: &str = "User Upload";

/// One immutable release record of an [`Ingredient`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub version_string: String,
    pub release_date: String,
    pub released_by: String,
    #[serde(default)]
    pub is_newer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Version {
    /// Build the version record for a custom upload dated today.
    pub fn custom_upload(version_string: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: format!("v-custom-{}", Uuid::new_v4().simple()),
            version_string: version_string.into(),
            release_date: Utc::now().format("%m/%d/%Y").to_string(),
            released_by: USER_UPLOAD.to_string(),
            is_newer: true,
            description,
        }
    }

    pub fn is_user_upload(&self) -> bool {
        self.released_by == USER_UPLOAD
    }
}

/// A named, versioned software/firmware artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project_feed: String,
    #[serde(default)]
    pub silicon_family: String,
    #[serde(default)]
    pub release_count: u32,
    /// Newest first.
    pub versions: Vec<Version>,
}

impl Ingredient {
    pub fn version(&self, version_id: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    pub fn version_by_string(&self, version_string: &str) -> Option<&Version> {
        self.versions
            .iter()
            .find(|v| v.version_string == version_string)
    }

    /// Versions whose version string contains `term`, case-insensitively.
    pub fn search_versions(&self, term: &str) -> Vec<&Version> {
        let lower = term.to_lowercase();
        self.versions
            .iter()
            .filter(|v| v.version_string.to_lowercase().contains(&lower))
            .collect()
    }
}

/// A custom-upload version together with the ingredient that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadEntry<'a> {
    pub ingredient: &'a Ingredient,
    pub version: &'a Version,
}

/// The owned ingredient repository for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct IngredientCatalog {
    ingredients: Vec<Ingredient>,
}

impl IngredientCatalog {
    /// Build a catalog, rejecting duplicate ingredient or version ids.
    pub fn new(ingredients: Vec<Ingredient>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for ingredient in &ingredients {
            if !seen.insert(ingredient.id.as_str()) {
                return Err(RecipeError::InvalidSeed(format!(
                    "duplicate ingredient id {}",
                    ingredient.id
                )));
            }
            let mut versions = std::collections::HashSet::new();
            for version in &ingredient.versions {
                if !versions.insert(version.id.as_str()) {
                    return Err(RecipeError::InvalidSeed(format!(
                        "duplicate version id {} in ingredient {}",
                        version.id, ingredient.id
                    )));
                }
            }
        }
        Ok(Self { ingredients })
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn get(&self, ingredient_id: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == ingredient_id)
    }

    pub fn require(&self, ingredient_id: &str) -> Result<&Ingredient> {
        self.get(ingredient_id)
            .ok_or_else(|| RecipeError::IngredientNotFound(ingredient_id.to_string()))
    }

    /// Look up a version and confirm it belongs to the given ingredient.
    pub fn require_version(&self, ingredient_id: &str, version_id: &str) -> Result<&Version> {
        self.require(ingredient_id)?
            .version(version_id)
            .ok_or_else(|| RecipeError::VersionNotFound {
                ingredient: ingredient_id.to_string(),
                version: version_id.to_string(),
            })
    }

    /// Ingredients whose name contains `term`, case-insensitively.
    pub fn search(&self, term: &str) -> Vec<&Ingredient> {
        let lower = term.to_lowercase();
        self.ingredients
            .iter()
            .filter(|i| i.name.to_lowercase().contains(&lower))
            .collect()
    }

    /// Prepend a version to an ingredient's list. Existing versions are
    /// never reordered or removed.
    pub fn prepend_version(&mut self, ingredient_id: &str, version: Version) -> Result<&Version> {
        let ingredient = self
            .ingredients
            .iter_mut()
            .find(|i| i.id == ingredient_id)
            .ok_or_else(|| RecipeError::IngredientNotFound(ingredient_id.to_string()))?;
        ingredient.versions.insert(0, version);
        Ok(&ingredient.versions[0])
    }

    /// Every user-uploaded version, filtered by ingredient name, version
    /// string or description. An empty term matches everything.
    pub fn custom_uploads(&self, term: &str) -> Vec<UploadEntry<'_>> {
        let lower = term.to_lowercase();
        self.ingredients
            .iter()
            .flat_map(|ingredient| {
                ingredient
                    .versions
                    .iter()
                    .filter(|v| v.is_user_upload())
                    .map(move |version| UploadEntry {
                        ingredient,
                        version,
                    })
            })
            .filter(|entry| {
                entry.ingredient.name.to_lowercase().contains(&lower)
                    || entry.version.version_string.to_lowercase().contains(&lower)
                    || entry
                        .version
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&lower))
            })
            .collect()
    }
}
