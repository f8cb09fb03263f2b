//! Catastrophic-command blacklist (spec section 4.5, design note
//! supplement): independent of `allow_commands`, checked first and
//! unconditionally as defense in depth. Grounded on this codebase's own
//! command-blacklist module.

use regex::RegexSet;

const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    (r"rm\s+(-\w*r\w*f\w*|-\w*f\w*r\w*)\s+/(\s|$)", "recursive forced delete of the root filesystem"),
    (r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;", "fork bomb"),
    (r"dd\s+.*of=/dev/(sd|nvme|hd)", "raw write to a block device"),
    (r"mkfs(\.\w+)?\s+/dev/", "filesystem creation on a raw device"),
    (r"chmod\s+-R\s+\S+\s+/(\s|$)", "recursive chmod on the root filesystem"),
    (r"chown\s+-R\s+\S+\s+/(\s|$)", "recursive chown on the root filesystem"),
    (r"(?i)remove-item\s+.*-recurse.*-force.*[a-z]:\\(\s|$)", "recursive forced delete of a Windows drive root"),
    (r"(?i)\b(rd|ri)\s+/s\s+/q\s+[a-z]:\\(\s|$)", "recursive quiet delete of a Windows drive root"),
];

pub struct CommandBlacklist {
    set: RegexSet,
    reasons: Vec<&'static str>,
}

impl CommandBlacklist {
    #[must_use]
    pub fn new() -> Self {
        let patterns: Vec<&str> = DEFAULT_PATTERNS.iter().map(|(p, _)| *p).collect();
        let set = RegexSet::new(patterns).expect("default blacklist patterns are valid regex");
        let reasons = DEFAULT_PATTERNS.iter().map(|(_, r)| *r).collect();
        Self { set, reasons }
    }

    /// Returns the reason the command is blocked, if any pattern matches.
    #[must_use]
    pub fn check(&self, command_text: &str) -> Option<&'static str> {
        self.set
            .matches(command_text)
            .iter()
            .next()
            .map(|idx| self.reasons[idx])
    }
}

impl Default for CommandBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_rm_rf_root() {
        let bl = CommandBlacklist::new();
        assert!(bl.check("rm -rf /").is_some());
    }

    #[test]
    fn blocks_fork_bomb() {
        let bl = CommandBlacklist::new();
        assert!(bl.check(":(){ :|:& };:").is_some());
    }

    #[test]
    fn allows_benign_command() {
        let bl = CommandBlacklist::new();
        assert!(bl.check("ls -la /tmp").is_none());
    }

    #[test]
    fn allows_rm_rf_of_a_subdirectory() {
        let bl = CommandBlacklist::new();
        assert!(bl.check("rm -rf ./build").is_none());
    }
}
