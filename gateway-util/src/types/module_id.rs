use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifies one measured quantity (temperature, humidity, ...) of a device
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u16);

impl ModuleId {
    pub const fn new(value: u16) -> Self {
        Self(value)
    }
}

impl Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
