//! Session command tests: seed loading, JSON command replay, snapshots and
//! custom uploads.

use std::io::Write;

use recipe_core::{
    ChangeType, CommandOutcome, OverrideFilter, RecipeError, Session, SessionCommand,
    SessionSnapshot, StageOutcome, USER_UPLOAD,
};

const SEED: &str = r#"{
    "ingredients": [
        {"id": "ing-ec", "name": "PTL_EC", "versions": [
            {"id": "ec-2", "versionString": "2025.12.4", "releaseDate": "12/04/2025", "releasedBy": "bot"},
            {"id": "ec-1", "versionString": "2025.11.30", "releaseDate": "11/30/2025", "releasedBy": "bot"}
        ]},
        {"id": "ing-pmc", "name": "PTL_PMC", "versions": [
            {"id": "pmc-1", "versionString": "150.3", "releaseDate": "11/11/2025", "releasedBy": "bot"}
        ]}
    ],
    "types": [
        {"id": "ec", "label": "EC", "category": "KEY_INGREDIENTS", "status": "CONFIGURED",
         "current": {"ingredientId": "ing-ec", "versionId": "ec-1"}, "order": 0},
        {"id": "pmc", "label": "PMC", "category": "STANDARD", "status": "NOT_CONFIGURED", "order": 1},
        {"id": "ucode", "label": "Microcode", "category": "LOCKED", "status": "LOCKED", "order": 2}
    ],
    "knobs": [
        {"knobName": "BootMode", "type": "oneof", "categoryPath": "Boot", "defaultValue": "0x0",
         "options": [{"text": "Normal", "value": "0x0"}, {"text": "Recovery", "value": "0x1"}]}
    ],
    "steps": [
        {"id": "build", "label": "Build IFWI", "stage": "Build"},
        {"id": "test", "label": "Smoke", "stage": "Test", "status": "Running"}
    ]
}"#;

fn session() -> Session {
    Session::from_seed_json(SEED).unwrap()
}

#[test]
fn seed_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SEED.as_bytes()).unwrap();
    let session = Session::from_seed_path(file.path()).unwrap();
    assert_eq!(session.steps().len(), 2);
    assert_eq!(session.staging().types().len(), 3);
    assert_eq!(session.knobs().len(), 1);
}

#[test]
fn missing_seed_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Session::from_seed_path(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, RecipeError::Io(_)));
}

#[test]
fn malformed_seed_is_serialization_error() {
    let err = Session::from_seed_json("{\"types\": 3}").unwrap_err();
    assert!(matches!(err, RecipeError::Serialization(_)));
}

#[test]
fn duplicate_type_ids_are_rejected() {
    let json = SEED.replace(r#""id": "pmc", "label""#, r#""id": "ec", "label""#);
    assert!(matches!(
        Session::from_seed_json(&json),
        Err(RecipeError::InvalidSeed(_))
    ));
}

#[test]
fn script_replay_stages_and_commits() {
    let mut s = session();
    let script = r#"[
        {"op": "open_for_editing"},
        {"op": "stage_version", "type_id": "ec", "version_id": "ec-2"},
        {"op": "stage_ingredient_and_version", "type_id": "pmc", "ingredient_id": "ing-pmc", "version_id": "pmc-1"},
        {"op": "toggle_pin", "type_id": "ucode"},
        {"op": "commit_all"},
        {"op": "set_override", "step_id": "build", "key": "BootMode", "value": "0x3"}
    ]"#;
    let commands: Vec<SessionCommand> = serde_json::from_str(script).unwrap();
    let outcomes = s.execute_all(commands).unwrap();

    assert_eq!(outcomes[0], CommandOutcome::Opened { types: 2 });
    assert_eq!(
        outcomes[1],
        CommandOutcome::Staged {
            type_id: "ec".to_string(),
            outcome: StageOutcome::Applied,
            change_type: ChangeType::VersionChange,
        }
    );
    assert_eq!(
        outcomes[3],
        CommandOutcome::Updated {
            type_id: "ucode".to_string(),
            outcome: StageOutcome::SkippedLocked,
        }
    );
    match &outcomes[4] {
        CommandOutcome::Committed(summary) => assert_eq!(summary.applied, vec!["ec", "pmc"]),
        other => panic!("unexpected outcome {:?}", other),
    }
    match &outcomes[5] {
        CommandOutcome::OverrideWritten { validation, .. } => {
            assert!(validation.is_warning());
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let snapshot = s.snapshot();
    assert_eq!(snapshot.pending_change_count, 0);
    assert!(snapshot.has_user_modifications);
    assert_eq!(snapshot.step_overrides["build"]["BootMode"], "0x3");
}

#[test]
fn failed_command_stops_replay_and_leaves_state() {
    let mut s = session();
    s.open_for_editing();
    let before = s.snapshot();

    let err = s
        .execute_all(vec![
            SessionCommand::StageVersion {
                type_id: "ec".to_string(),
                version_id: "pmc-1".to_string(),
            },
            SessionCommand::CommitAll,
        ])
        .unwrap_err();
    assert!(matches!(err, RecipeError::VersionNotFound { .. }));
    assert_eq!(s.snapshot(), before);
}

#[test]
fn staging_before_open_is_rejected() {
    let mut s = session();
    let err = s
        .execute(SessionCommand::StageVersion {
            type_id: "ec".to_string(),
            version_id: "ec-2".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, RecipeError::EditingNotOpen));
}

#[test]
fn snapshot_round_trips_through_json() {
    let mut s = session();
    s.open_for_editing();
    s.stage_version("ec", "ec-2").unwrap();
    let snapshot = s.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
    assert_eq!(back.types[0].change_type, ChangeType::VersionChange);
}

#[test]
fn custom_upload_is_listed_and_reusable() {
    let mut s = session();
    s.open_for_editing();
    let upload = s
        .register_custom_upload("ec", "ing-ec", "2025.12.9-local", Some("bisect build".into()))
        .unwrap();
    let version = upload.version.unwrap();
    assert!(version.id.starts_with("v-custom-"));
    assert_eq!(version.released_by, USER_UPLOAD);
    assert!(version.is_newer);
    assert_eq!(
        s.component("ec").unwrap().change_type(),
        ChangeType::CustomUpload
    );

    let listed = s.custom_uploads("bisect");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].ingredient.id, "ing-ec");
    assert!(s.custom_uploads("nothing-like-this").is_empty());

    // Re-use the upload on another slot.
    let version_id = listed[0].version.id.clone();
    s.stage_ingredient_and_version("pmc", "ing-ec", &version_id)
        .unwrap();
    assert_eq!(
        s.component("pmc").unwrap().change_type(),
        ChangeType::IngredientChange
    );
}

#[test]
fn select_version_by_string_uses_staged_ingredient() {
    let mut s = session();
    s.open_for_editing();
    s.select_version_by_string("ec", "2025.12.4").unwrap();
    assert_eq!(
        s.component("ec").unwrap().staged.version_id.as_deref(),
        Some("ec-2")
    );
    assert!(matches!(
        s.select_version_by_string("ec", "150.3"),
        Err(RecipeError::VersionNotFound { .. })
    ));
}

#[test]
fn ingredient_and_version_search() {
    let s = session();
    let names: Vec<_> = s.search_ingredients("ptl").iter().map(|i| i.id.clone()).collect();
    assert_eq!(names, vec!["ing-ec", "ing-pmc"]);
    assert_eq!(s.search_versions("ing-ec", "11.30").unwrap().len(), 1);
    assert!(s.search_versions("ing-none", "").is_err());
}

#[test]
fn override_rows_filter_by_search_and_kind() {
    let mut s = session();
    s.set_override("test", "BootMode", "0x1").unwrap();
    s.set_override("test", "Scratch", "abc").unwrap();

    let user = s.override_rows("test", OverrideFilter::User, "").unwrap();
    assert_eq!(user.len(), 1);
    assert_eq!(user[0].knob_name, "Scratch");

    let recovery = s.override_rows("test", OverrideFilter::All, "recovery").unwrap();
    assert_eq!(recovery.len(), 1);
    assert_eq!(recovery[0].display_value, "Recovery (0x1)");
    assert_eq!(recovery[0].baseline_value.as_deref(), Some("0x0"));
}

#[test]
fn reorder_and_move_through_commands() {
    let mut s = session();
    let outcome = s
        .execute(SessionCommand::MoveType {
            dragged_id: "pmc".to_string(),
            target_id: "ec".to_string(),
        })
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::Reordered(_)));
    let ids: Vec<_> = s.snapshot().types.iter().map(|v| v.record.id.clone()).collect();
    assert_eq!(ids, vec!["pmc", "ec", "ucode"]);

    let err = s
        .execute(SessionCommand::Reorder {
            sequence: vec!["ec".to_string()],
        })
        .unwrap_err();
    assert!(matches!(err, RecipeError::InvalidOrder(_)));
}
