use serde::{Deserialize, Serialize};

/// Configuration for the agency_sync module (`modules.agency_sync` in the app config)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgencySyncConfig {
    #[serde(default)]
    pub collections: CollectionNames,
    /// How many of the newest transactions a fetch brings in.
    #[serde(default = "default_transactions_window")]
    pub transactions_window: u32,
    #[serde(default = "default_activity_capacity")]
    pub activity_capacity: usize,
}

/// Remote collection names. Older deployments keep the vault in `vault_credentials`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CollectionNames {
    #[serde(default = "default_clients")]
    pub clients: String,
    #[serde(default = "default_transactions")]
    pub transactions: String,
    #[serde(default = "default_credentials")]
    pub credentials: String,
}

impl Default for AgencySyncConfig {
    fn default() -> Self {
        Self {
            collections: CollectionNames::default(),
            transactions_window: default_transactions_window(),
            activity_capacity: default_activity_capacity(),
        }
    }
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            clients: default_clients(),
            transactions: default_transactions(),
            credentials: default_credentials(),
        }
    }
}

fn default_transactions_window() -> u32 {
    50
}

fn default_activity_capacity() -> usize {
    20
}

fn default_clients() -> String {
    "clients".to_string()
}

fn default_transactions() -> String {
    "transactions".to_string()
}

fn default_credentials() -> String {
    "credentials".to_string()
}
