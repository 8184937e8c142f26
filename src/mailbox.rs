use anyhow::{bail, Context, Result};
use std::process::Command;

/// Lists mailbox names hosted on this server.
pub trait MailboxLister {
    fn list_mailboxes(&self) -> Result<String>;
}

pub const DEFAULT_MAILBOX_COMMAND: &str =
    "plesk bin mail --list | awk '{print $2}' | sort | uniq | grep -v name";

/// Runs a shell pipeline and returns its stdout.
pub struct ShellMailboxLister {
    command: String,
}

impl ShellMailboxLister {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl MailboxLister for ShellMailboxLister {
    fn list_mailboxes(&self) -> Result<String> {
        log::debug!("Listing mailboxes with: {}", self.command);
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .with_context(|| format!("Failed to run mailbox command: {}", self.command))?;

        if !output.status.success() {
            bail!(
                "mailbox command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_is_returned() {
        let lister = ShellMailboxLister::new("printf 'info@example.com\\nsales@example.com\\n'");
        assert_eq!(
            lister.list_mailboxes().unwrap(),
            "info@example.com\nsales@example.com\n"
        );
    }

    #[test]
    fn test_failure_carries_stderr() {
        let lister = ShellMailboxLister::new("echo 'plesk: not found' >&2; exit 127");
        let err = lister.list_mailboxes().unwrap_err();
        assert!(err.to_string().contains("plesk: not found"));
    }
}
