// src/engine/mode.rs

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// What a run is allowed to touch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Classify only; no filesystem writes at all
    #[default]
    Analyze,
    /// Report what would happen; logs only
    DryRun,
    Copy,
    Move,
    /// Regenerate sidecars in the hub
    RepairStyles,
}

impl Mode {
    pub const ALL: [Mode; 5] = [Mode::Analyze, Mode::DryRun, Mode::Copy, Mode::Move, Mode::RepairStyles];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Analyze => "analyze",
            Mode::DryRun => "dry-run",
            Mode::Copy => "copy",
            Mode::Move => "move",
            Mode::RepairStyles => "repair-styles",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Sidecars and the feature cache may be written
    pub fn writes_hub(&self) -> bool {
        matches!(self, Mode::Copy | Mode::Move | Mode::RepairStyles)
    }

    /// A log directory with report and run log is created
    pub fn writes_logs(&self) -> bool {
        !matches!(self, Mode::Analyze)
    }

    pub fn transfers(&self) -> bool {
        matches!(self, Mode::Copy | Mode::Move)
    }

    /// Loose inbox files may be wrapped into a pack folder
    pub fn touches_inbox(&self) -> bool {
        matches!(self, Mode::DryRun | Mode::Copy | Mode::Move)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(Mode::as_str).collect();
            format!("Unknown mode: {} (expected one of {})", s, known.join(", "))
        })
    }
}
