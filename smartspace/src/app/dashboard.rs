//! The dashboard: active profile plus its device and routine registries

use std::sync::Arc;

use tracing::info;

use crate::errors::SmartSpaceError;
use crate::models::ProfileId;
use crate::notify::Notifier;
use crate::registry::{DeviceRegistry, RoutineRegistry};
use crate::storage::ProfileStore;

pub struct Dashboard {
    store: ProfileStore,
    devices: DeviceRegistry,
    routines: RoutineRegistry,
}

impl Dashboard {
    /// Open the dashboard on the recorded active profile
    pub fn open(store: ProfileStore, notifier: Arc<dyn Notifier>) -> Self {
        let profile = store.active_profile();
        info!("Opening dashboard on profile '{}'", profile);
        let devices = DeviceRegistry::new(store.clone(), notifier.clone(), profile.clone());
        let routines = RoutineRegistry::new(store.clone(), notifier, profile);
        Self {
            store,
            devices,
            routines,
        }
    }

    pub fn profile(&self) -> &ProfileId {
        self.devices.profile()
    }

    /// Profiles the user can switch between
    pub fn profiles(&self) -> Vec<ProfileId> {
        let mut profiles = ProfileId::builtin();
        if !profiles.contains(self.profile()) {
            profiles.push(self.profile().clone());
        }
        profiles
    }

    /// Record `profile` as active and load its collections
    pub fn switch_profile(&mut self, profile: ProfileId) -> Result<(), SmartSpaceError> {
        self.store.set_active_profile(&profile)?;
        self.devices.activate(profile.clone());
        self.routines.activate(profile);
        Ok(())
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.devices
    }

    pub fn routines(&self) -> &RoutineRegistry {
        &self.routines
    }

    pub fn routines_mut(&mut self) -> &mut RoutineRegistry {
        &mut self.routines
    }
}
