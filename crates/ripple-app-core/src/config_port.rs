// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config port shared across Ripple tools.

use tracing::warn;

use crate::config::{ConfigService, ConfigStore};
use crate::prefs::BroadcastPrefs;

/// Key broadcast prefs are stored under.
pub const PREFS_KEY: &str = "broadcast_prefs";

/// Config-facing port for loading/saving broadcast preferences.
pub trait ConfigPort {
    /// Load broadcast preferences (returns None if missing or unreadable).
    fn load_prefs(&self) -> Option<BroadcastPrefs>;
    /// Persist broadcast preferences (best-effort; failures are logged).
    fn save_prefs(&self, prefs: &BroadcastPrefs);
}

impl<S: ConfigStore> ConfigPort for ConfigService<S> {
    fn load_prefs(&self) -> Option<BroadcastPrefs> {
        match self.load(PREFS_KEY) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(key = PREFS_KEY, error = %err, "failed to load prefs");
                None
            }
        }
    }

    fn save_prefs(&self, prefs: &BroadcastPrefs) {
        if let Err(err) = self.save(PREFS_KEY, prefs) {
            warn!(key = PREFS_KEY, error = %err, "failed to save prefs");
        }
    }
}
