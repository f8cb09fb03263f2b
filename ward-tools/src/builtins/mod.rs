pub mod files;
pub mod git;
pub mod memory;
pub mod reminders;
pub mod run_command;
pub mod safe;
pub mod tasks;
pub mod web;
