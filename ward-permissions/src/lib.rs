//! The permissions model, path capability, and command capability
//! (spec sections 4.3, 4.4, 4.5): the fail-closed boundary between tool
//! handlers and the host filesystem/process table.

pub mod blacklist;
pub mod command;
pub mod fetch;
pub mod permissions;
pub mod process;
pub mod sandbox;

pub use blacklist::CommandBlacklist;
pub use command::{CommandCapability, CommandError, CommandOutput};
pub use fetch::{FetchCapability, FetchError, FetchOutput};
pub use permissions::{Permissions, PermissionsError};
pub use sandbox::{PathMode, Sandbox, SandboxError};
