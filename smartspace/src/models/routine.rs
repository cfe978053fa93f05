//! Routine models
//!
//! Routines are stored automation rule definitions. Nothing here executes
//! them; the schedule and conditions are data for display and editing.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ValidationErrors;

/// Routine identifier, unique within a profile
pub type RoutineId = u64;

const MIN_NAME_LEN: usize = 2;
const MIN_DESCRIPTION_LEN: usize = 10;

/// Routine priority, serialized with the dashboard's labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "alta", alias = "high")]
    High,
    #[default]
    #[serde(rename = "media", alias = "medium")]
    Medium,
    #[serde(rename = "baja", alias = "low")]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "alta",
            Priority::Medium => "media",
            Priority::Low => "baja",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation-independent routine category; the UI maps it to an icon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Morning,
    Night,
    Away,
    WorkStart,
    Meeting,
    Closing,
    #[default]
    Custom,
}

/// When a routine is meant to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schedule {
    /// Triggered by hand
    Manual,
    /// Time of day
    At(NaiveTime),
}

impl FromStr for Schedule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("manual") {
            return Ok(Schedule::Manual);
        }
        NaiveTime::parse_from_str(s, "%H:%M")
            .map(Schedule::At)
            .map_err(|_| format!("Invalid schedule '{}': expected HH:MM or 'manual'", s))
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Manual => f.write_str("manual"),
            Schedule::At(time) => write!(f, "{}", time.format("%H:%M")),
        }
    }
}

impl Serialize for Schedule {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An automation rule definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: RoutineId,
    pub name: String,
    pub description: String,
    pub active: bool,
    #[serde(default)]
    pub kind: RoutineKind,
    pub schedule: Schedule,
    pub priority: Priority,
    /// Names of the devices the routine references
    pub devices: Vec<String>,
    pub conditions: Vec<String>,
    pub actions: Vec<String>,
}

/// Fields supplied when creating a routine; the registry assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoutine {
    pub name: String,
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub kind: RoutineKind,
    pub schedule: Schedule,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl NewRoutine {
    pub(crate) fn into_routine(self, id: RoutineId) -> Routine {
        Routine {
            id,
            name: self.name,
            description: self.description,
            active: self.active,
            kind: self.kind,
            schedule: self.schedule,
            priority: self.priority,
            devices: self.devices,
            conditions: self.conditions,
            actions: self.actions,
        }
    }
}

/// Partial routine update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutinePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RoutineKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

impl RoutinePatch {
    /// Merge the present fields into `routine`. The id is never changed.
    pub fn apply(self, routine: &mut Routine) {
        if let Some(name) = self.name {
            routine.name = name;
        }
        if let Some(description) = self.description {
            routine.description = description;
        }
        if let Some(active) = self.active {
            routine.active = active;
        }
        if let Some(kind) = self.kind {
            routine.kind = kind;
        }
        if let Some(schedule) = self.schedule {
            routine.schedule = schedule;
        }
        if let Some(priority) = self.priority {
            routine.priority = priority;
        }
        if let Some(devices) = self.devices {
            routine.devices = devices;
        }
        if let Some(conditions) = self.conditions {
            routine.conditions = conditions;
        }
        if let Some(actions) = self.actions {
            routine.actions = actions;
        }
    }
}

/// Unvalidated routine input, as typed into the create/edit form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutineDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl RoutineDraft {
    /// Check every field and collect all failures.
    ///
    /// Routines entered through the form are created active with the
    /// `Custom` kind.
    pub fn validate(self) -> Result<NewRoutine, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().chars().count() < MIN_NAME_LEN {
            errors.add(
                "name",
                format!("Name must be at least {} characters", MIN_NAME_LEN),
            );
        }
        if self.description.trim().chars().count() < MIN_DESCRIPTION_LEN {
            errors.add(
                "description",
                format!(
                    "Description must be at least {} characters",
                    MIN_DESCRIPTION_LEN
                ),
            );
        }

        let schedule = if self.schedule.trim().is_empty() {
            errors.add("schedule", "A schedule must be selected");
            None
        } else {
            match self.schedule.parse::<Schedule>() {
                Ok(schedule) => Some(schedule),
                Err(e) => {
                    errors.add("schedule", e);
                    None
                }
            }
        };

        let devices = non_blank(self.devices);
        let conditions = non_blank(self.conditions);
        let actions = non_blank(self.actions);
        if devices.is_empty() {
            errors.add("devices", "At least one device must be selected");
        }
        if conditions.is_empty() {
            errors.add("conditions", "At least one condition is required");
        }
        if actions.is_empty() {
            errors.add("actions", "At least one action is required");
        }

        match schedule {
            Some(schedule) if errors.is_empty() => Ok(NewRoutine {
                name: self.name.trim().to_string(),
                description: self.description.trim().to_string(),
                active: true,
                kind: RoutineKind::Custom,
                schedule,
                priority: self.priority,
                devices,
                conditions,
                actions,
            }),
            _ => Err(errors),
        }
    }
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
