//! JSONL-backed storage primitives (spec section 4.1, 4.2, 4.10): the
//! append/read/atomic-rewrite substrate, and the memory/task/reminder/
//! audit/command-log stores built on top of it.

pub mod atomic_write;
pub mod audit;
pub mod jsonl;
pub mod memory;
pub mod reminders;
pub mod tasks;

pub use atomic_write::{AtomicWriteError, atomic_write};
pub use audit::{AuditLog, CommandLog};
pub use jsonl::JsonlError;
pub use memory::MemoryStore;
pub use reminders::ReminderStore;
pub use tasks::TaskStore;
