//! Change classifier for staged component bindings.
//!
//! [`classify`] is a pure function of the staged pair, the original pair and
//! the pending intent. It answers NONE when nothing is pending or when both
//! ids are back to their original values, and otherwise returns the intent
//! unchanged.

use crate::domain::component::{Binding, ChangeIntent, ChangeType};

/// Classify a staged binding against its revert target.
pub fn classify(staged: &Binding, original: &Binding, intent: Option<ChangeIntent>) -> ChangeType {
    match intent {
        None => ChangeType::None,
        Some(_) if staged == original => ChangeType::None,
        Some(intent) => intent.into(),
    }
}

/// Intent for a version-only selection given the record's pending intent.
/// A pending ingredient-level change stays ingredient-level, even while its
/// staged pair happens to equal the original.
pub fn version_selection_intent(pending: Option<ChangeIntent>) -> ChangeIntent {
    match pending {
        Some(ChangeIntent::IngredientChange) => ChangeIntent::IngredientChange,
        _ => ChangeIntent::VersionChange,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_pairs_are_none_whatever_the_intent() {
        let pair = Binding::new("ing-ec", "v-ec-0");
        for intent in [
            None,
            Some(ChangeIntent::VersionChange),
            Some(ChangeIntent::IngredientChange),
            Some(ChangeIntent::CustomUpload),
        ] {
            assert_eq!(classify(&pair, &pair, intent), ChangeType::None);
        }
    }

    #[test]
    fn both_null_pairs_are_equal() {
        assert_eq!(
            classify(
                &Binding::unbound(),
                &Binding::unbound(),
                Some(ChangeIntent::IngredientChange)
            ),
            ChangeType::None
        );
    }

    #[test]
    fn differing_pairs_return_intent() {
        let staged = Binding::new("ing-ec", "v-ec-1");
        let original = Binding::new("ing-ec", "v-ec-0");
        assert_eq!(
            classify(&staged, &original, Some(ChangeIntent::VersionChange)),
            ChangeType::VersionChange
        );
        assert_eq!(
            classify(&staged, &original, Some(ChangeIntent::IngredientChange)),
            ChangeType::IngredientChange
        );
    }

    #[test]
    fn half_matching_pair_is_not_none() {
        let staged = Binding::new("ing-other", "v-ec-0");
        let original = Binding::new("ing-ec", "v-ec-0");
        assert_eq!(
            classify(&staged, &original, Some(ChangeIntent::IngredientChange)),
            ChangeType::IngredientChange
        );
    }

    #[test]
    fn no_intent_is_none_even_when_pairs_differ() {
        let staged = Binding::new("ing-ec", "v-ec-1");
        let original = Binding::new("ing-ec", "v-ec-0");
        assert_eq!(classify(&staged, &original, None), ChangeType::None);
    }

    #[test]
    fn version_selection_keeps_ingredient_level() {
        assert_eq!(
            version_selection_intent(Some(ChangeIntent::IngredientChange)),
            ChangeIntent::IngredientChange
        );
        assert_eq!(
            version_selection_intent(Some(ChangeIntent::CustomUpload)),
            ChangeIntent::VersionChange
        );
        assert_eq!(
            version_selection_intent(Some(ChangeIntent::VersionChange)),
            ChangeIntent::VersionChange
        );
        assert_eq!(version_selection_intent(None), ChangeIntent::VersionChange);
    }
}
