//! The command capability (spec section 4.5): validate a command + flags +
//! path arguments against the allow-list, then run it as a short-lived
//! subprocess with a timeout and output cap.

use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncReadExt as _;
use tokio::process::Command;
use tokio::time::timeout;
use ward_types::ErrorCode;

use crate::blacklist::CommandBlacklist;
use crate::permissions::Permissions;
use crate::sandbox::{PathMode, Sandbox, SandboxError};

/// Hard cap on captured stdout/stderr, independent of what the process
/// actually produced.
const OUTPUT_CAP_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandExitCode {
    Timeout,
    Signal,
    ExecError,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("command `{name}` is not in allow_commands")]
    NotAllowed { name: String },
    #[error("command `{name}` rejected flag `{flag}`")]
    BadFlag { name: String, flag: String },
    #[error("command blocked by catastrophic-pattern blacklist: {reason}")]
    Blacklisted { reason: &'static str },
    #[error(transparent)]
    Path(#[from] SandboxError),
    #[error("failed to spawn `{name}`: {source}")]
    Spawn {
        name: String,
        source: std::io::Error,
    },
    #[error("command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("command terminated by signal")]
    Signal,
    #[error("command exited with status {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

impl CommandError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotAllowed { .. } => ErrorCode::DeniedCommandAllowlist,
            Self::BadFlag { .. } | Self::Blacklisted { .. } => ErrorCode::DeniedCommandFlag,
            Self::Path(e) => e.code(),
            Self::Spawn { .. } => ErrorCode::ExecError,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Signal => ErrorCode::Signal,
            Self::NonZeroExit { .. } => ErrorCode::ExecError,
        }
    }
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// A command's flag allow-list plus the literal subcommand tokens (if
/// any) it accepts as its leading positional, e.g. `git status`. A
/// subcommand token is matched literally and never routed through the
/// path capability; every other non-flag positional is a path argument
/// (spec section 4.5, step 3).
struct CommandSchema {
    flags: &'static [&'static str],
    subcommands: &'static [&'static str],
}

fn command_schema(command_name: &str) -> CommandSchema {
    match command_name {
        "ls" => CommandSchema { flags: &["-l", "-a", "-h", "-R"], subcommands: &[] },
        "du" => CommandSchema { flags: &["-h", "-s", "-a"], subcommands: &[] },
        "git" => CommandSchema {
            flags: &["--no-pager", "--oneline"],
            subcommands: &["status", "diff", "log"],
        },
        _ => CommandSchema { flags: &[], subcommands: &[] },
    }
}

pub struct CommandCapability<'a> {
    permissions: &'a Permissions,
    sandbox: &'a Sandbox<'a>,
    blacklist: &'a CommandBlacklist,
    base_dir: &'a Path,
}

impl<'a> CommandCapability<'a> {
    #[must_use]
    pub fn new(
        permissions: &'a Permissions,
        sandbox: &'a Sandbox<'a>,
        blacklist: &'a CommandBlacklist,
        base_dir: &'a Path,
    ) -> Self {
        Self {
            permissions,
            sandbox,
            blacklist,
            base_dir,
        }
    }

    /// `run(name, argv, stdin?) -> {stdout, stderr, exitCode} | error`,
    /// steps 1-5 of spec section 4.5.
    pub async fn run(&self, name: &str, argv: &[String]) -> Result<CommandOutput, CommandError> {
        if !self.permissions.is_allowed_command(name) {
            return Err(CommandError::NotAllowed {
                name: name.to_string(),
            });
        }

        let full_text = format!("{name} {}", argv.join(" "));
        if let Some(reason) = self.blacklist.check(&full_text) {
            return Err(CommandError::Blacklisted { reason });
        }

        let schema = command_schema(name);
        let mut resolved_args: Vec<String> = Vec::with_capacity(argv.len());
        let mut subcommand_seen = false;
        for arg in argv {
            if let Some(flag) = arg.strip_prefix('-') {
                let _ = flag;
                if !schema.flags.contains(&arg.as_str()) {
                    return Err(CommandError::BadFlag {
                        name: name.to_string(),
                        flag: arg.clone(),
                    });
                }
                resolved_args.push(arg.clone());
            } else if !subcommand_seen && schema.subcommands.contains(&arg.as_str()) {
                subcommand_seen = true;
                resolved_args.push(arg.clone());
            } else {
                let resolved = self.sandbox.resolve_allowed(arg, PathMode::Read)?;
                resolved_args.push(resolved.to_string_lossy().into_owned());
            }
        }

        let timeout_ms = self.permissions.limits().command_timeout_ms;
        self.spawn_and_wait(name, &resolved_args, timeout_ms).await
    }

    async fn spawn_and_wait(
        &self,
        name: &str,
        args: &[String],
        timeout_ms: u64,
    ) -> Result<CommandOutput, CommandError> {
        let mut command = Command::new(name);
        command
            .args(args)
            .current_dir(self.base_dir)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        crate::process::set_new_session(&mut command);

        let mut child = command.spawn().map_err(|source| CommandError::Spawn {
            name: name.to_string(),
            source,
        })?;

        let mut stdout_pipe = child.stdout.take().expect("stdout was piped");
        let mut stderr_pipe = child.stderr.take().expect("stderr was piped");
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout_pipe
                .take(OUTPUT_CAP_BYTES as u64)
                .read_to_end(&mut buf)
                .await;
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr_pipe
                .take(OUTPUT_CAP_BYTES as u64)
                .read_to_end(&mut buf)
                .await;
            buf
        });

        let mut guard = crate::process::ChildGuard::new(child);
        let wait_result = timeout(
            Duration::from_millis(timeout_ms),
            guard.child_mut().wait(),
        )
        .await;

        let status = match wait_result {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                return Err(CommandError::Spawn {
                    name: name.to_string(),
                    source,
                });
            }
            Err(_elapsed) => {
                return Err(CommandError::Timeout { timeout_ms });
            }
        };

        let _ = guard.disarm();
        let stdout_bytes = stdout_task.await.unwrap_or_default();
        let stderr_bytes = stderr_task.await.unwrap_or_default();
        let stdout = String::from_utf8_lossy(&stdout_bytes).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_bytes).into_owned();

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt as _;
            if let Some(_signal) = status.signal() {
                return Err(CommandError::Signal);
            }
        }

        match status.code() {
            Some(0) => Ok(CommandOutput {
                stdout,
                stderr,
                exit_code: 0,
            }),
            Some(code) => Err(CommandError::NonZeroExit { code, stderr }),
            None => Err(CommandError::Signal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use ward_types::{Limits, PermissionsDocument};

    fn permissions_for(dir: &Path, commands: &[&str]) -> Permissions {
        let doc = PermissionsDocument {
            version: 1,
            allow_paths: vec!["./".to_string()],
            allow_commands: commands.iter().map(|s| s.to_string()).collect(),
            require_confirmation_for: HashSet::new(),
            deny_tools: HashSet::new(),
            limits: Limits::default(),
            allow_read_env: false,
        };
        Permissions::from_document(doc, dir).unwrap()
    }

    #[tokio::test]
    async fn rejects_unlisted_command() {
        let dir = tempfile::tempdir().unwrap();
        let perms = permissions_for(dir.path(), &[]);
        let sandbox = Sandbox::new(&perms, dir.path().to_path_buf());
        let blacklist = CommandBlacklist::new();
        let cap = CommandCapability::new(&perms, &sandbox, &blacklist, dir.path());
        let err = cap.run("ls", &[]).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DeniedCommandAllowlist);
    }

    #[tokio::test]
    async fn rejects_unknown_flag() {
        let dir = tempfile::tempdir().unwrap();
        let perms = permissions_for(dir.path(), &["ls"]);
        let sandbox = Sandbox::new(&perms, dir.path().to_path_buf());
        let blacklist = CommandBlacklist::new();
        let cap = CommandCapability::new(&perms, &sandbox, &blacklist, dir.path());
        let err = cap
            .run("ls", &["-z".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DeniedCommandFlag);
    }

    #[tokio::test]
    async fn runs_allow_listed_command_with_allowed_flag() {
        let dir = tempfile::tempdir().unwrap();
        let perms = permissions_for(dir.path(), &["ls"]);
        let sandbox = Sandbox::new(&perms, dir.path().to_path_buf());
        let blacklist = CommandBlacklist::new();
        let cap = CommandCapability::new(&perms, &sandbox, &blacklist, dir.path());
        let result = cap.run("ls", &["-a".to_string()]).await.unwrap();
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn git_subcommand_token_bypasses_path_capability() {
        let dir = tempfile::tempdir().unwrap();
        std::process::Command::new("git")
            .arg("init")
            .current_dir(dir.path())
            .output()
            .unwrap();
        let perms = permissions_for(dir.path(), &["git"]);
        let sandbox = Sandbox::new(&perms, dir.path().to_path_buf());
        let blacklist = CommandBlacklist::new();
        let cap = CommandCapability::new(&perms, &sandbox, &blacklist, dir.path());

        let result = cap
            .run("git", &["--no-pager".to_string(), "status".to_string()])
            .await
            .unwrap();
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn git_subcommand_is_only_recognized_once() {
        let dir = tempfile::tempdir().unwrap();
        let perms = permissions_for(dir.path(), &["git"]);
        let sandbox = Sandbox::new(&perms, dir.path().to_path_buf());
        let blacklist = CommandBlacklist::new();
        let cap = CommandCapability::new(&perms, &sandbox, &blacklist, dir.path());

        // A second occurrence of a subcommand word is treated as a path
        // argument, not a literal, and fails for lack of such a file.
        let err = cap
            .run("git", &["status".to_string(), "status".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DeniedPathTraversal);
    }
}
