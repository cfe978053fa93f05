//! Device registry tests

use std::collections::HashSet;
use std::sync::Arc;

use smartspace::models::{DeviceKind, DevicePatch, DeviceStatus, NewDevice, ProfileId};
use smartspace::notify::{NoticeBuffer, NoticeLevel};
use smartspace::registry::DeviceRegistry;
use smartspace::storage::ProfileStore;

fn new_device(name: &str) -> NewDevice {
    NewDevice {
        name: name.to_string(),
        kind: DeviceKind::Light,
        brand: "Philips Hue".to_string(),
        location: "Cocina".to_string(),
        data: None,
    }
}

fn registry(store: &ProfileStore) -> (DeviceRegistry, Arc<NoticeBuffer>) {
    let notices = Arc::new(NoticeBuffer::default());
    let registry = DeviceRegistry::new(store.clone(), notices.clone(), ProfileId::home());
    (registry, notices)
}

#[test]
fn test_added_ids_are_unique() {
    let store = ProfileStore::in_memory();
    let (mut registry, _) = registry(&store);

    for i in 0..5 {
        registry.add_device(new_device(&format!("Lamp {}", i))).unwrap();
    }

    let ids: HashSet<_> = registry.devices().iter().map(|d| d.id).collect();
    assert_eq!(ids.len(), 8);
}

#[test]
fn test_added_device_is_online_and_persisted() {
    let store = ProfileStore::in_memory();
    let (mut registry, notices) = registry(&store);

    let device = registry.add_device(new_device("Lamp")).unwrap();
    assert_eq!(device.status, DeviceStatus::Online);
    assert_eq!(
        store.stored_devices(&ProfileId::home()).unwrap(),
        registry.devices()
    );
    assert_eq!(notices.notices().last().unwrap().level, NoticeLevel::Success);
}

#[test]
fn test_toggle_twice_restores_status() {
    let store = ProfileStore::in_memory();
    let (mut registry, _) = registry(&store);

    assert_eq!(
        registry.toggle_device_status(1).unwrap(),
        Some(DeviceStatus::Offline)
    );
    assert_eq!(
        registry.toggle_device_status(1).unwrap(),
        Some(DeviceStatus::Online)
    );
    assert_eq!(registry.device(1).unwrap().status, DeviceStatus::Online);
}

#[test]
fn test_unknown_id_is_a_no_op() {
    let store = ProfileStore::in_memory();
    let (mut registry, _) = registry(&store);
    let before = registry.devices().to_vec();

    assert!(!registry.remove_device(99).unwrap());
    assert!(!registry
        .update_device(99, DevicePatch {
            name: Some("x".to_string()),
            ..Default::default()
        })
        .unwrap());
    assert_eq!(registry.toggle_device_status(99).unwrap(), None);
    assert_eq!(registry.devices(), before.as_slice());
}

#[test]
fn test_update_keeps_id_and_persists() {
    let store = ProfileStore::in_memory();
    let (mut registry, _) = registry(&store);

    let patch = DevicePatch {
        name: Some("Luces Salón".to_string()),
        ..Default::default()
    };
    assert!(registry.update_device(1, patch).unwrap());

    let stored = store.stored_devices(&ProfileId::home()).unwrap();
    assert_eq!(stored[0].id, 1);
    assert_eq!(stored[0].name, "Luces Salón");
    assert_eq!(stored[0].brand, "Philips Hue");
}

#[test]
fn test_subscribers_see_every_change() {
    let store = ProfileStore::in_memory();
    let (mut registry, _) = registry(&store);
    let receiver = registry.subscribe();

    registry.remove_device(3).unwrap();
    assert_eq!(receiver.borrow().len(), 2);
}
