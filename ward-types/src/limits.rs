//! Resource limits carried by the permissions document (spec section 6).

use serde::{Deserialize, Serialize};

const fn default_max_input_length() -> usize {
    10_000
}

const fn default_max_read_size() -> usize {
    1_048_576
}

const fn default_command_timeout_ms() -> u64 {
    10_000
}

const fn default_fetch_timeout_ms() -> u64 {
    6_000
}

const fn default_max_memory_entries() -> usize {
    10_000
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_max_memory_entries")]
    pub max_memory_entries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_length: default_max_input_length(),
            max_read_size: default_max_read_size(),
            command_timeout_ms: default_command_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_memory_entries: default_max_memory_entries(),
        }
    }
}
