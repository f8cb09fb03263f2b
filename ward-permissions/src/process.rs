//! Subprocess lifecycle management for the command capability. Grounded on
//! this codebase's own process-guard module: an RAII guard kills the
//! child (its whole process group, on Unix) if the future driving it is
//! ever dropped before the child exits on its own.

use tokio::process::Child;

/// Puts the spawned child in its own session/process group before exec, so
/// a single `killpg` later reaches any grandchildren the command itself
/// spawned (a shell wrapper, for instance).
#[cfg(unix)]
pub fn set_new_session(command: &mut tokio::process::Command) {
    use std::os::unix::process::CommandExt as _;
    // Safety: `setsid()` is async-signal-safe and is the only thing done
    // in this pre-exec hook; it has no interaction with the parent's
    // memory beyond the syscall itself.
    unsafe {
        command.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
pub fn set_new_session(_command: &mut tokio::process::Command) {}

/// RAII wrapper that kills the child (and, on Unix, its whole process
/// group) if dropped while still running. Guards against a cancelled or
/// panicking future leaving an orphaned subprocess behind.
pub struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    #[must_use]
    pub fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    pub fn child_mut(&mut self) -> &mut Child {
        self.child.as_mut().expect("child guard used after disarm")
    }

    /// Take ownership of the child without killing it on drop, once it has
    /// exited on its own.
    pub fn disarm(mut self) -> Child {
        self.child.take().expect("child guard used after disarm")
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let Some(child) = &mut self.child else {
            return;
        };
        let Some(pid) = child.id() else {
            return;
        };

        #[cfg(unix)]
        {
            // Negative pid targets the whole process group created by
            // `set_new_session`.
            unsafe {
                libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = child.start_kill();
        }
        let _ = pid;
    }
}
