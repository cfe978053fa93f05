//! Routine registry for the active profile

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::errors::SmartSpaceError;
use crate::models::{NewRoutine, ProfileId, Routine, RoutineDraft, RoutineId, RoutinePatch};
use crate::notify::{Notice, Notifier};
use crate::storage::defaults::default_routines;
use crate::storage::ProfileStore;
use crate::utils::next_id;

/// In-memory routine collection of one profile.
///
/// Keeps the collection as it was at the last load or seed so that
/// [`RoutineRegistry::reset_routines`] can return to it.
pub struct RoutineRegistry {
    store: ProfileStore,
    notifier: Arc<dyn Notifier>,
    profile: ProfileId,
    routines: Vec<Routine>,
    snapshot: Vec<Routine>,
    snapshot_tx: watch::Sender<Vec<Routine>>,
}

impl RoutineRegistry {
    /// Load (or seed) the routines of `profile`
    pub fn new(store: ProfileStore, notifier: Arc<dyn Notifier>, profile: ProfileId) -> Self {
        let routines = store.load_routines(&profile);
        let (snapshot_tx, _) = watch::channel(routines.clone());
        Self {
            store,
            notifier,
            profile,
            snapshot: routines.clone(),
            routines,
            snapshot_tx,
        }
    }

    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    pub fn routine(&self, id: RoutineId) -> Option<&Routine> {
        self.routines.iter().find(|r| r.id == id)
    }

    /// The collection `reset_routines` returns to
    pub fn snapshot(&self) -> &[Routine] {
        &self.snapshot
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Routine>> {
        self.snapshot_tx.subscribe()
    }

    /// Drop the in-memory collection and load the one of `profile`
    pub fn activate(&mut self, profile: ProfileId) {
        self.routines = self.store.load_routines(&profile);
        self.snapshot = self.routines.clone();
        info!(
            "Activated profile '{}' with {} routine(s)",
            profile,
            self.routines.len()
        );
        self.profile = profile;
        self.publish();
    }

    pub fn add_routine(&mut self, new: NewRoutine) -> Result<Routine, SmartSpaceError> {
        let id = next_id(self.routines.iter().map(|r| r.id));
        let routine = new.into_routine(id);
        self.routines.push(routine.clone());
        self.commit()?;

        info!("Added routine {} '{}'", routine.id, routine.name);
        self.notifier.notify(Notice::success(
            "Routine created",
            format!("{} was created successfully", routine.name),
        ));
        Ok(routine)
    }

    /// Validate form input, then add it as an active custom routine
    pub fn add_validated(&mut self, draft: RoutineDraft) -> Result<Routine, SmartSpaceError> {
        let new = draft.validate()?;
        self.add_routine(new)
    }

    /// Merge `patch` into the routine; `false` when the id is unknown
    pub fn update_routine(
        &mut self,
        id: RoutineId,
        patch: RoutinePatch,
    ) -> Result<bool, SmartSpaceError> {
        let Some(routine) = self.routines.iter_mut().find(|r| r.id == id) else {
            debug!("Ignoring update of unknown routine {}", id);
            return Ok(false);
        };
        patch.apply(routine);
        self.commit()?;

        self.notifier.notify(Notice::success(
            "Routine updated",
            "Changes were saved successfully",
        ));
        Ok(true)
    }

    /// Validate form input and replace the edited fields of the routine.
    /// Its active flag and kind are kept.
    pub fn update_validated(
        &mut self,
        id: RoutineId,
        draft: RoutineDraft,
    ) -> Result<bool, SmartSpaceError> {
        let new = draft.validate()?;
        let patch = RoutinePatch {
            name: Some(new.name),
            description: Some(new.description),
            schedule: Some(new.schedule),
            priority: Some(new.priority),
            devices: Some(new.devices),
            conditions: Some(new.conditions),
            actions: Some(new.actions),
            ..Default::default()
        };
        self.update_routine(id, patch)
    }

    pub fn remove_routine(&mut self, id: RoutineId) -> Result<bool, SmartSpaceError> {
        let Some(index) = self.routines.iter().position(|r| r.id == id) else {
            debug!("Ignoring removal of unknown routine {}", id);
            return Ok(false);
        };
        let removed = self.routines.remove(index);
        self.commit()?;

        info!("Removed routine {} '{}'", removed.id, removed.name);
        self.notifier.notify(Notice::success(
            "Routine removed",
            format!("{} was removed", removed.name),
        ));
        Ok(true)
    }

    /// Flip the active flag; returns the new value, `None` for unknown ids
    pub fn toggle_routine(&mut self, id: RoutineId) -> Result<Option<bool>, SmartSpaceError> {
        let Some(routine) = self.routines.iter_mut().find(|r| r.id == id) else {
            debug!("Ignoring toggle of unknown routine {}", id);
            return Ok(None);
        };
        routine.active = !routine.active;
        let active = routine.active;
        self.commit()?;

        debug!("Routine {} active: {}", id, active);
        Ok(Some(active))
    }

    /// Return to the collection captured at the last load or seed
    pub fn reset_routines(&mut self) -> Result<(), SmartSpaceError> {
        self.routines = self.snapshot.clone();
        self.commit()?;

        info!(
            "Reset routines of profile '{}' to {} routine(s)",
            self.profile,
            self.routines.len()
        );
        self.notifier.notify(Notice::success(
            "Routines reset",
            "Routines were restored",
        ));
        Ok(())
    }

    /// Replace the collection with the profile's built-in defaults and make
    /// them the new reset point
    pub fn restore_factory_defaults(&mut self) -> Result<(), SmartSpaceError> {
        self.routines = default_routines(&self.profile);
        self.snapshot = self.routines.clone();
        self.commit()?;

        info!("Restored default routines of profile '{}'", self.profile);
        self.notifier.notify(Notice::success(
            "Routines reset",
            "Default routines were restored",
        ));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SmartSpaceError> {
        self.publish();
        if let Err(e) = self.store.save_routines(&self.profile, &self.routines) {
            error!(
                "Failed to persist routines for profile '{}': {}",
                self.profile, e
            );
            self.notifier.notify(Notice::error(
                "Error",
                "Routine changes could not be saved",
            ));
            return Err(e);
        }
        Ok(())
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.routines.clone());
    }
}
