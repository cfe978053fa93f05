//! Device models

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationErrors;

/// Device identifier, unique within a profile
pub type DeviceId = u64;

/// Telemetry readings keyed by metric name (power, temperature, brightness, battery)
pub type Telemetry = BTreeMap<String, f64>;

/// Device category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Light,
    Climate,
    Security,
    Entertainment,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Light => "light",
            DeviceKind::Climate => "climate",
            DeviceKind::Security => "security",
            DeviceKind::Entertainment => "entertainment",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device reachability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    #[default]
    Online,
    Offline,
}

impl DeviceStatus {
    /// The other status
    pub fn toggled(self) -> Self {
        match self {
            DeviceStatus::Online => DeviceStatus::Offline,
            DeviceStatus::Offline => DeviceStatus::Online,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A controllable device of a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique device ID within the profile
    pub id: DeviceId,

    /// Display name
    pub name: String,

    /// Device category
    #[serde(rename = "type")]
    pub kind: DeviceKind,

    /// Online or offline
    pub status: DeviceStatus,

    /// Brand label (e.g., "Philips Hue")
    pub brand: String,

    /// Location label (e.g., "Sala de Reuniones")
    pub location: String,

    /// Optional telemetry readings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Telemetry>,
}

impl Device {
    /// Telemetry reading by metric name
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.data.as_ref().and_then(|d| d.get(name).copied())
    }
}

/// Fields supplied when creating a device; the registry assigns id and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub brand: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Telemetry>,
}

impl NewDevice {
    /// Name, brand and location must not be blank
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "Name is required");
        }
        if self.brand.trim().is_empty() {
            errors.add("brand", "Brand is required");
        }
        if self.location.trim().is_empty() {
            errors.add("location", "Location is required");
        }
        errors.into_result(())
    }

    pub(crate) fn into_device(self, id: DeviceId) -> Device {
        Device {
            id,
            name: self.name,
            kind: self.kind,
            status: DeviceStatus::Online,
            brand: self.brand,
            location: self.location,
            data: self.data,
        }
    }
}

/// Partial device update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<DeviceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Telemetry>,
}

impl DevicePatch {
    /// Merge the present fields into `device`. The id is never changed.
    pub fn apply(self, device: &mut Device) {
        if let Some(name) = self.name {
            device.name = name;
        }
        if let Some(kind) = self.kind {
            device.kind = kind;
        }
        if let Some(status) = self.status {
            device.status = status;
        }
        if let Some(brand) = self.brand {
            device.brand = brand;
        }
        if let Some(location) = self.location {
            device.location = location;
        }
        if let Some(data) = self.data {
            device.data = Some(data);
        }
    }
}
