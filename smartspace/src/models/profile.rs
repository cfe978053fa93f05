//! Profile identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named partition scoping both device and routine collections
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Home profile, the default when nothing is recorded
    pub const HOME: &'static str = "casa";

    /// Office profile
    pub const OFFICE: &'static str = "oficina";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn home() -> Self {
        Self::new(Self::HOME)
    }

    pub fn office() -> Self {
        Self::new(Self::OFFICE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Profiles that ship with default data
    pub fn builtin() -> Vec<ProfileId> {
        vec![Self::home(), Self::office()]
    }

    /// Capitalized name for display, e.g. "Casa"
    pub fn display_name(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::home()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProfileId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
