//! Staging lifecycle tests: open → stage → commit / revert over a small
//! catalog with one locked slot.

use recipe_core::{
    classify, Binding, Category, ChangeIntent, ChangeType, ComponentSeed, ComponentStatus,
    DependencyStagingStore, Ingredient, IngredientCatalog, RecipeError, Source, StageOutcome,
    Version,
};

fn version(id: &str, version_string: &str) -> Version {
    Version {
        id: id.to_string(),
        version_string: version_string.to_string(),
        release_date: "12/01/2025".to_string(),
        released_by: "Release Bot".to_string(),
        is_newer: false,
        description: None,
    }
}

fn catalog() -> IngredientCatalog {
    IngredientCatalog::new(vec![
        Ingredient {
            id: "ing-bios".to_string(),
            name: "PTL_BIOS".to_string(),
            project_feed: "PTL".to_string(),
            silicon_family: "Panther Lake".to_string(),
            release_count: 3,
            versions: vec![
                version("bios-3", "3013.00"),
                version("bios-2", "3012.00"),
                version("bios-1", "3011.00"),
            ],
        },
        Ingredient {
            id: "ing-bios-dbg".to_string(),
            name: "PTL_BIOS_DBG".to_string(),
            project_feed: "PTL".to_string(),
            silicon_family: "Panther Lake".to_string(),
            release_count: 1,
            versions: vec![version("bios-dbg-1", "3012.00-dbg")],
        },
    ])
    .unwrap()
}

fn seed(
    id: &str,
    category: Category,
    status: ComponentStatus,
    current: Binding,
    order: u32,
) -> ComponentSeed {
    ComponentSeed {
        id: id.to_string(),
        label: id.to_string(),
        category,
        status,
        source: Source::Baseline,
        current,
        is_pinned: false,
        order,
    }
}

fn store() -> DependencyStagingStore {
    DependencyStagingStore::from_seeds(vec![
        seed(
            "bios",
            Category::KeyIngredients,
            ComponentStatus::Configured,
            Binding::new("ing-bios", "bios-1"),
            0,
        ),
        seed(
            "ish",
            Category::Standard,
            ComponentStatus::NotConfigured,
            Binding::unbound(),
            1,
        ),
        seed(
            "ucode",
            Category::Locked,
            ComponentStatus::Locked,
            Binding::unbound(),
            2,
        ),
    ])
    .unwrap()
}

#[test]
fn open_then_revert_restores_fresh_record() {
    let mut s = store();
    let before = s.get("bios").unwrap().clone();

    s.open_for_editing();
    s.revert_type("bios").unwrap();

    let after = s.get("bios").unwrap();
    assert_eq!(after, &before);
    assert_eq!(after.change_type(), ChangeType::None);
}

#[test]
fn classify_is_deterministic() {
    let original = Binding::new("ing-bios", "bios-1");
    let staged = Binding::new("ing-bios", "bios-2");
    for intent in [
        None,
        Some(ChangeIntent::VersionChange),
        Some(ChangeIntent::IngredientChange),
        Some(ChangeIntent::CustomUpload),
    ] {
        let first = classify(&staged, &original, intent);
        let second = classify(&staged, &original, intent);
        assert_eq!(first, second);
    }
    assert_eq!(
        classify(&original, &original, Some(ChangeIntent::IngredientChange)),
        ChangeType::None
    );
}

#[test]
fn stage_version_back_to_original_is_none() {
    let cat = catalog();
    let mut s = store();
    s.open_for_editing();

    s.stage_version(&cat, "bios", "bios-3").unwrap();
    assert_eq!(s.pending_change_count(), 1);
    s.stage_version(&cat, "bios", "bios-1").unwrap();

    assert_eq!(s.get("bios").unwrap().change_type(), ChangeType::None);
    assert_eq!(s.pending_change_count(), 0);
}

#[test]
fn ingredient_change_survives_version_switch() {
    let cat = catalog();
    let mut s = store();
    s.open_for_editing();

    s.stage_ingredient_and_version(&cat, "bios", "ing-bios-dbg", "bios-dbg-1")
        .unwrap();
    s.stage_version(&cat, "bios", "bios-dbg-1").unwrap();
    assert_eq!(
        s.get("bios").unwrap().change_type(),
        ChangeType::IngredientChange
    );
}

#[test]
fn ingredient_pick_of_original_pair_keeps_intent_for_version_switch() {
    let cat = catalog();
    let mut s = store();
    s.open_for_editing();

    s.stage_ingredient_and_version(&cat, "bios", "ing-bios", "bios-1")
        .unwrap();
    assert_eq!(s.get("bios").unwrap().change_type(), ChangeType::None);
    assert_eq!(
        s.get("bios").unwrap().pending_intent,
        Some(ChangeIntent::IngredientChange)
    );

    s.stage_version(&cat, "bios", "bios-2").unwrap();
    assert_eq!(
        s.get("bios").unwrap().change_type(),
        ChangeType::IngredientChange
    );
}

#[test]
fn commit_all_is_idempotent() {
    let cat = catalog();
    let mut s = store();
    s.open_for_editing();
    s.stage_version(&cat, "bios", "bios-2").unwrap();
    s.stage_ingredient_and_version(&cat, "ish", "ing-bios-dbg", "bios-dbg-1")
        .unwrap();

    let first = s.commit_all();
    assert_eq!(first.applied_count(), 2);
    let after_first = s.clone();

    let second = s.commit_all();
    assert_eq!(second.applied_count(), 0);
    assert_eq!(s, after_first);
}

#[test]
fn commit_then_reopen_takes_new_baseline() {
    let cat = catalog();
    let mut s = store();
    s.open_for_editing();
    s.stage_version(&cat, "bios", "bios-2").unwrap();
    s.commit_all();

    s.open_for_editing();
    let bios = s.get("bios").unwrap();
    assert_eq!(bios.original, Binding::new("ing-bios", "bios-2"));
    assert_eq!(bios.source, Source::User);
    assert_eq!(bios.change_type(), ChangeType::None);
}

#[test]
fn revert_all_returns_to_original_pairs() {
    let cat = catalog();
    let mut s = store();
    s.open_for_editing();
    s.stage_version(&cat, "bios", "bios-3").unwrap();
    s.stage_ingredient_and_version(&cat, "ish", "ing-bios", "bios-2")
        .unwrap();
    s.commit_all();
    assert!(s.has_user_modifications());

    let summary = s.revert_all();
    assert_eq!(summary.applied, vec!["bios", "ish"]);
    assert_eq!(summary.skipped_locked, vec!["ucode"]);
    assert!(!s.has_user_modifications());

    let ish = s.get("ish").unwrap();
    assert!(ish.current.is_unbound());
    assert_eq!(ish.status, ComponentStatus::NotConfigured);
    assert_eq!(
        s.get("bios").unwrap().current,
        Binding::new("ing-bios", "bios-1")
    );
}

#[test]
fn locked_type_fields_never_change() {
    let mut cat = catalog();
    let mut s = store();
    s.open_for_editing();
    let before = s.get("ucode").unwrap().clone();

    let outcomes = [
        s.stage_ingredient_and_version(&cat, "ucode", "ing-bios", "bios-1")
            .unwrap(),
        s.stage_version(&cat, "ucode", "bios-1").unwrap(),
        s.select_version_by_string(&cat, "ucode", "3011.00").unwrap(),
        s.apply_inline_version_change(&cat, "ucode", "bios-1")
            .unwrap(),
        s.discard_staged("ucode").unwrap(),
        s.toggle_pin("ucode").unwrap(),
        s.revert_type("ucode").unwrap(),
        s.register_custom_upload(&mut cat, "ucode", "ing-bios", "x", None)
            .unwrap()
            .outcome,
    ];
    assert!(outcomes.iter().all(|o| *o == StageOutcome::SkippedLocked));

    s.commit_all();
    s.revert_all();
    s.reorder(&["ucode".to_string(), "ish".to_string(), "bios".to_string()])
        .unwrap();

    assert_eq!(s.get("ucode").unwrap(), &before);
}

#[test]
fn unknown_identifiers_are_typed_errors() {
    let cat = catalog();
    let mut s = store();
    s.open_for_editing();
    let before = s.clone();

    assert!(matches!(
        s.stage_version(&cat, "nope", "bios-1"),
        Err(RecipeError::TypeNotFound(_))
    ));
    assert!(matches!(
        s.stage_ingredient_and_version(&cat, "bios", "ing-nope", "bios-1"),
        Err(RecipeError::IngredientNotFound(_))
    ));
    assert!(matches!(
        s.stage_version(&cat, "bios", "bios-dbg-1"),
        Err(RecipeError::VersionNotFound { .. })
    ));
    assert!(matches!(
        s.stage_version(&cat, "ish", "bios-1"),
        Err(RecipeError::TypeNotBound(_))
    ));
    assert_eq!(s, before);
}

#[test]
fn move_type_reorders_through_drop_position() {
    let mut s = store();
    s.move_type("bios", "ucode").unwrap();
    let ids: Vec<_> = s.ordered().iter().map(|t| t.id.clone()).collect();
    // The locked slot keeps its order value, so it ties with bios.
    assert_eq!(s.get("ish").unwrap().order, 0);
    assert_eq!(s.get("bios").unwrap().order, 2);
    assert_eq!(ids[0], "ish");
}
