//! Profile-scoped persistence of devices, routines, the active profile and
//! the cached session.
//!
//! Devices and routines each live under one top-level key holding a JSON
//! object of profile id -> collection. Writes replace only the entry of the
//! profile being saved; other entries are carried over verbatim, even when
//! they fail to parse.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::SmartSpaceError;
use crate::models::{Device, ProfileId, Routine, Session};
use crate::storage::defaults::{default_devices, default_routines};
use crate::storage::kv::{KeyValueStore, MemoryStore};

/// Key holding profile -> device list
pub const DEVICES_KEY: &str = "smartspace_devices";

/// Key holding profile -> routine list
pub const ROUTINES_KEY: &str = "smartspace_routines";

/// Key holding the active profile id as plain text
pub const PROFILE_KEY: &str = "smartspace_profile";

/// Key holding the persisted session
pub const SESSION_KEY: &str = "smartspace_session";

type Record = BTreeMap<String, Value>;

/// Profile-aware store adapter over a [`KeyValueStore`]
#[derive(Clone)]
pub struct ProfileStore {
    backend: Arc<dyn KeyValueStore>,
}

impl ProfileStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Store backed by process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The underlying key-value backend
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    // ================================ DEVICES ================================ //

    /// Write the profile's default devices if its entry is missing or empty.
    ///
    /// Returns whether anything was written.
    pub fn seed_devices(&self, profile: &ProfileId) -> Result<bool, SmartSpaceError> {
        self.seed(DEVICES_KEY, profile, default_devices)
    }

    /// Devices of the profile, seeding defaults first when needed
    pub fn load_devices(&self, profile: &ProfileId) -> Vec<Device> {
        if let Err(e) = self.seed_devices(profile) {
            warn!("Failed to seed devices for profile '{}': {}", profile, e);
        }
        match self.stored_devices(profile) {
            Some(devices) if !devices.is_empty() => devices,
            _ => default_devices(profile),
        }
    }

    /// Replace the profile's stored devices
    pub fn save_devices(
        &self,
        profile: &ProfileId,
        devices: &[Device],
    ) -> Result<(), SmartSpaceError> {
        self.save(DEVICES_KEY, profile, devices)
    }

    /// Raw read without seeding; `None` when the profile has no entry
    pub fn stored_devices(&self, profile: &ProfileId) -> Option<Vec<Device>> {
        self.read_entry(DEVICES_KEY, profile)
    }

    // ================================ ROUTINES =============================== //

    /// Write the profile's default routines if its entry is missing or empty
    pub fn seed_routines(&self, profile: &ProfileId) -> Result<bool, SmartSpaceError> {
        self.seed(ROUTINES_KEY, profile, default_routines)
    }

    /// Routines of the profile, seeding defaults first when needed
    pub fn load_routines(&self, profile: &ProfileId) -> Vec<Routine> {
        if let Err(e) = self.seed_routines(profile) {
            warn!("Failed to seed routines for profile '{}': {}", profile, e);
        }
        match self.stored_routines(profile) {
            Some(routines) if !routines.is_empty() => routines,
            _ => default_routines(profile),
        }
    }

    /// Replace the profile's stored routines
    pub fn save_routines(
        &self,
        profile: &ProfileId,
        routines: &[Routine],
    ) -> Result<(), SmartSpaceError> {
        self.save(ROUTINES_KEY, profile, routines)
    }

    /// Raw read without seeding; `None` when the profile has no entry
    pub fn stored_routines(&self, profile: &ProfileId) -> Option<Vec<Routine>> {
        self.read_entry(ROUTINES_KEY, profile)
    }

    // ============================ ACTIVE PROFILE ============================= //

    /// The recorded active profile, `casa` when none is recorded
    pub fn active_profile(&self) -> ProfileId {
        match self.backend.get(PROFILE_KEY) {
            Ok(Some(id)) if !id.trim().is_empty() => ProfileId::new(id.trim()),
            Ok(_) => ProfileId::default(),
            Err(e) => {
                warn!("Failed to read active profile, using default: {}", e);
                ProfileId::default()
            }
        }
    }

    /// Record the active profile
    pub fn set_active_profile(&self, profile: &ProfileId) -> Result<(), SmartSpaceError> {
        self.backend.set(PROFILE_KEY, profile.as_str())?;
        info!("Active profile set to '{}'", profile);
        Ok(())
    }

    // ================================ SESSION ================================ //

    /// The persisted session, if any
    pub fn load_session(&self) -> Option<Session> {
        let raw = match self.backend.get(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read stored session: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Discarding malformed stored session: {}", e);
                None
            }
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<(), SmartSpaceError> {
        let raw = serde_json::to_string(session)?;
        self.backend.set(SESSION_KEY, &raw)
    }

    pub fn clear_session(&self) -> Result<(), SmartSpaceError> {
        self.backend.remove(SESSION_KEY)
    }

    // ================================ HELPERS ================================ //

    /// Read a top-level record. Unreadable or malformed records are logged
    /// and treated as absent.
    fn read_record(&self, key: &str) -> Option<Record> {
        let raw = match self.backend.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read '{}', treating as empty: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str::<Record>(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Malformed data under '{}', treating as empty: {}", key, e);
                None
            }
        }
    }

    fn read_entry<T: DeserializeOwned>(&self, key: &str, profile: &ProfileId) -> Option<T> {
        let mut record = self.read_record(key)?;
        let value = record.remove(profile.as_str())?;
        match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(
                    "Malformed '{}' entry for profile '{}', ignoring it: {}",
                    key, profile, e
                );
                None
            }
        }
    }

    fn save<T: Serialize>(
        &self,
        key: &str,
        profile: &ProfileId,
        items: &[T],
    ) -> Result<(), SmartSpaceError> {
        let mut record = self.read_record(key).unwrap_or_default();
        record.insert(profile.to_string(), serde_json::to_value(items)?);
        self.backend.set(key, &serde_json::to_string(&record)?)?;
        debug!("Saved {} item(s) under '{}' for profile '{}'", items.len(), key, profile);
        Ok(())
    }

    fn seed<T: Serialize + DeserializeOwned>(
        &self,
        key: &str,
        profile: &ProfileId,
        defaults: fn(&ProfileId) -> Vec<T>,
    ) -> Result<bool, SmartSpaceError> {
        let existing: Option<Vec<T>> = self.read_entry(key, profile);
        if existing.as_ref().is_some_and(|items| !items.is_empty()) {
            return Ok(false);
        }

        let items = defaults(profile);
        if items.is_empty() && existing.is_some() {
            return Ok(false);
        }
        self.save(key, profile, &items)?;
        info!(
            "Seeded {} default item(s) under '{}' for profile '{}'",
            items.len(),
            key,
            profile
        );
        Ok(true)
    }
}
