// ⚙️ Settings - user preferences carried along in every snapshot
// The core never interprets these beyond persisting and backing them up.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_true")]
    pub show_onboarding: bool,

    #[serde(default)]
    pub hide_balances: bool,

    /// Preferences added by newer app versions round-trip untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            currency: default_currency(),
            show_onboarding: true,
            hide_balances: false,
            extra: BTreeMap::new(),
        }
    }
}
