//! Device registry for the active profile

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::errors::SmartSpaceError;
use crate::models::{Device, DeviceId, DevicePatch, DeviceStatus, NewDevice, ProfileId};
use crate::notify::{Notice, Notifier};
use crate::storage::ProfileStore;
use crate::utils::next_id;

/// In-memory device collection of one profile, written through to the store
/// on every mutation
pub struct DeviceRegistry {
    store: ProfileStore,
    notifier: Arc<dyn Notifier>,
    profile: ProfileId,
    devices: Vec<Device>,
    snapshot_tx: watch::Sender<Vec<Device>>,
}

impl DeviceRegistry {
    /// Load (or seed) the devices of `profile`
    pub fn new(store: ProfileStore, notifier: Arc<dyn Notifier>, profile: ProfileId) -> Self {
        let devices = store.load_devices(&profile);
        let (snapshot_tx, _) = watch::channel(devices.clone());
        Self {
            store,
            notifier,
            profile,
            devices,
            snapshot_tx,
        }
    }

    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Receiver of collection snapshots, updated after every change
    pub fn subscribe(&self) -> watch::Receiver<Vec<Device>> {
        self.snapshot_tx.subscribe()
    }

    /// Drop the in-memory collection and load the one of `profile`
    pub fn activate(&mut self, profile: ProfileId) {
        self.devices = self.store.load_devices(&profile);
        info!(
            "Activated profile '{}' with {} device(s)",
            profile,
            self.devices.len()
        );
        self.profile = profile;
        self.publish();
    }

    /// Append a device with a fresh id; new devices start online
    pub fn add_device(&mut self, new: NewDevice) -> Result<Device, SmartSpaceError> {
        let id = next_id(self.devices.iter().map(|d| d.id));
        let device = new.into_device(id);
        self.devices.push(device.clone());
        self.commit()?;

        info!("Added device {} '{}'", device.id, device.name);
        self.notifier.notify(Notice::success(
            "Device added",
            format!("{} was added successfully", device.name),
        ));
        Ok(device)
    }

    /// Merge `patch` into the device; `false` when the id is unknown
    pub fn update_device(
        &mut self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> Result<bool, SmartSpaceError> {
        let Some(device) = self.devices.iter_mut().find(|d| d.id == id) else {
            debug!("Ignoring update of unknown device {}", id);
            return Ok(false);
        };
        patch.apply(device);
        self.commit()?;

        self.notifier.notify(Notice::success(
            "Device updated",
            "Changes were saved successfully",
        ));
        Ok(true)
    }

    /// Remove the device; `false` when the id is unknown
    pub fn remove_device(&mut self, id: DeviceId) -> Result<bool, SmartSpaceError> {
        let Some(index) = self.devices.iter().position(|d| d.id == id) else {
            debug!("Ignoring removal of unknown device {}", id);
            return Ok(false);
        };
        let removed = self.devices.remove(index);
        self.commit()?;

        info!("Removed device {} '{}'", removed.id, removed.name);
        self.notifier.notify(Notice::success(
            "Device removed",
            format!("{} was removed", removed.name),
        ));
        Ok(true)
    }

    /// Flip online/offline; returns the new status, `None` for unknown ids
    pub fn toggle_device_status(
        &mut self,
        id: DeviceId,
    ) -> Result<Option<DeviceStatus>, SmartSpaceError> {
        let Some(device) = self.devices.iter_mut().find(|d| d.id == id) else {
            debug!("Ignoring toggle of unknown device {}", id);
            return Ok(None);
        };
        device.status = device.status.toggled();
        let status = device.status;
        self.commit()?;

        debug!("Device {} is now {}", id, status);
        Ok(Some(status))
    }

    /// Persist the whole collection and publish a snapshot
    fn commit(&mut self) -> Result<(), SmartSpaceError> {
        self.publish();
        if let Err(e) = self.store.save_devices(&self.profile, &self.devices) {
            error!(
                "Failed to persist devices for profile '{}': {}",
                self.profile, e
            );
            self.notifier.notify(Notice::error(
                "Error",
                "Device changes could not be saved",
            ));
            return Err(e);
        }
        Ok(())
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.devices.clone());
    }
}
