// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted broadcast tuning shared by Ripple tools.

use ripple_core::{BroadcastOptions, DEFAULT_GRID_SIZE, DEFAULT_MAX_PASSES};
use serde::{Deserialize, Serialize};

/// Default relay step budget for `ripple run`.
pub const DEFAULT_MAX_STEPS: u32 = 10_000;

/// Saved broadcast preferences. Fields missing from a stored blob take their
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastPrefs {
    /// Cell size used to quantize neighbor positions.
    pub grid_size: u32,
    /// Retry passes per node before it gives up.
    pub max_passes: u32,
    /// Relay steps before a session is abandoned.
    pub max_steps: u32,
}

impl Default for BroadcastPrefs {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            max_passes: DEFAULT_MAX_PASSES,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl From<&BroadcastPrefs> for BroadcastOptions {
    fn from(prefs: &BroadcastPrefs) -> Self {
        Self {
            grid_size: prefs.grid_size,
            max_passes: prefs.max_passes,
        }
    }
}
