//! The raw, on-disk shape of the permissions document (spec section 6).
//!
//! This is the deserialization target only; `ward-permissions` turns it into
//! canonicalized, fast predicates. Missing fields take the defaults spelled
//! out here so a minimal document (`{"version":1,"allow_paths":["./"]}`)
//! is already valid.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::limits::Limits;

const CURRENT_VERSION: u32 = 1;

const fn default_version() -> u32 {
    CURRENT_VERSION
}

const fn default_allow_read_env() -> bool {
    false
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    pub allow_paths: Vec<String>,
    #[serde(default)]
    pub allow_commands: HashSet<String>,
    #[serde(default)]
    pub require_confirmation_for: HashSet<String>,
    #[serde(default)]
    pub deny_tools: HashSet<String>,
    #[serde(default)]
    pub limits: Limits,
    /// Widens (never narrows) the path capability's default-deny on
    /// reading `.env` files. Open question resolved in DESIGN.md.
    #[serde(default = "default_allow_read_env")]
    pub allow_read_env: bool,
}
