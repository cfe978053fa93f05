//! Routine registry tests

use std::sync::Arc;

use smartspace::app::dashboard::Dashboard;
use smartspace::models::{Priority, ProfileId, RoutineDraft, RoutineKind, Schedule};
use smartspace::notify::LogNotifier;
use smartspace::registry::RoutineRegistry;
use smartspace::storage::defaults::default_routines;
use smartspace::storage::ProfileStore;

fn test_draft() -> RoutineDraft {
    RoutineDraft {
        name: "Test".to_string(),
        description: "Routine used by the tests".to_string(),
        schedule: "09:30".to_string(),
        priority: Priority::Low,
        devices: vec!["Termostato".to_string()],
        conditions: vec!["Hora: 9:30 AM".to_string()],
        actions: vec!["Ajustar temperatura".to_string()],
    }
}

fn registry(store: &ProfileStore) -> RoutineRegistry {
    RoutineRegistry::new(store.clone(), Arc::new(LogNotifier), ProfileId::home())
}

#[test]
fn test_added_draft_becomes_active_custom_routine() {
    let store = ProfileStore::in_memory();
    let mut registry = registry(&store);

    let routine = registry.add_validated(test_draft()).unwrap();
    assert!(routine.active);
    assert_eq!(routine.kind, RoutineKind::Custom);
    assert_eq!(routine.schedule.to_string(), "09:30");
    assert_eq!(registry.routines().len(), 4);
    assert_eq!(
        store.stored_routines(&ProfileId::home()).unwrap().len(),
        4
    );
}

#[test]
fn test_invalid_draft_reports_every_field() {
    let store = ProfileStore::in_memory();
    let mut registry = registry(&store);

    let draft = RoutineDraft {
        name: "x".to_string(),
        ..Default::default()
    };
    let err = registry.add_validated(draft).unwrap_err();
    let message = err.to_string();
    for field in ["name", "description", "schedule", "devices", "conditions", "actions"] {
        assert!(message.contains(field), "missing {} in {}", field, message);
    }
    assert_eq!(registry.routines().len(), 3);
}

#[test]
fn test_reset_is_idempotent() {
    let store = ProfileStore::in_memory();
    let mut registry = registry(&store);
    registry.add_validated(test_draft()).unwrap();
    registry.toggle_routine(1).unwrap();

    registry.reset_routines().unwrap();
    let once = registry.routines().to_vec();
    registry.reset_routines().unwrap();

    assert_eq!(registry.routines(), once.as_slice());
    assert_eq!(once, default_routines(&ProfileId::home()));
}

#[test]
fn test_manual_schedule_is_accepted() {
    let store = ProfileStore::in_memory();
    let mut registry = registry(&store);
    let draft = RoutineDraft {
        schedule: "manual".to_string(),
        ..test_draft()
    };

    let routine = registry.add_validated(draft).unwrap();
    assert_eq!(routine.schedule, Schedule::Manual);
}

#[test]
fn test_switching_away_and_back_restores_routines() {
    let store = ProfileStore::in_memory();
    let mut dashboard = Dashboard::open(store, Arc::new(LogNotifier));
    dashboard.routines_mut().add_validated(test_draft()).unwrap();
    let home = dashboard.routines().routines().to_vec();

    dashboard.switch_profile(ProfileId::office()).unwrap();
    assert_eq!(dashboard.routines().routines()[0].name, "Inicio laboral");

    dashboard.switch_profile(ProfileId::home()).unwrap();
    assert_eq!(dashboard.routines().routines(), home.as_slice());
}
