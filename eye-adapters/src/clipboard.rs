//! Clipboard collaborator used by the copy action.

use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

/// Result alias for clipboard writes.
pub type ClipboardResult<T> = Result<T, ClipboardError>;

/// Errors surfaced when the platform refuses a clipboard write.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClipboardError {
    /// The platform rejected the write (permissions, locked session, ...).
    #[error("clipboard write denied: {reason}")]
    Denied {
        /// Additional context from the platform.
        reason: String,
    },

    /// No clipboard mechanism is available on this host.
    #[error("clipboard unavailable: {reason}")]
    Unavailable {
        /// Additional context for operators.
        reason: String,
    },
}

impl ClipboardError {
    /// Convenience constructor for denied writes.
    #[must_use]
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }
}

/// Destination for copied configuration text.
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Replaces the clipboard contents with `text`.
    async fn write_text(&self, text: &str) -> ClipboardResult<()>;
}

/// In-process clipboard, useful for headless sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    deny_reason: Option<String>,
}

impl MemoryClipboard {
    /// Creates an empty clipboard that accepts writes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clipboard that rejects every write with the given reason.
    #[must_use]
    pub fn denying(reason: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(None),
            deny_reason: Some(reason.into()),
        }
    }

    /// Returns the last text written.
    pub async fn contents(&self) -> Option<String> {
        self.contents.lock().await.clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> ClipboardResult<()> {
        if let Some(reason) = &self.deny_reason {
            return Err(ClipboardError::denied(reason.clone()));
        }
        *self.contents.lock().await = Some(text.to_owned());
        Ok(())
    }
}

/// Clipboard that pipes text into a platform helper such as `pbcopy`.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    /// Creates a clipboard that runs `program args...` and writes to its stdin.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the conventional helper for the current platform.
    #[must_use]
    pub fn platform_default() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::new("pbcopy", Vec::<String>::new()))
        } else if cfg!(target_os = "windows") {
            Some(Self::new("clip", Vec::<String>::new()))
        } else if cfg!(unix) {
            Some(Self::new("xclip", ["-selection", "clipboard"]))
        } else {
            None
        }
    }

    /// Returns the helper program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    async fn write_text(&self, text: &str) -> ClipboardResult<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ClipboardError::Unavailable {
                reason: format!("failed to start `{}`: {err}", self.program),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(text.as_bytes()).await {
                if let Err(kill_err) = child.kill().await {
                    debug!(program = %self.program, error = %kill_err, "helper already gone");
                }
                return Err(ClipboardError::denied(format!("failed to write: {err}")));
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|err| ClipboardError::denied(format!("helper did not finish: {err}")))?;

        if !status.success() {
            return Err(ClipboardError::denied(format!(
                "`{}` exited with {status}",
                self.program
            )));
        }

        debug!(program = %self.program, bytes = text.len(), "copied configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn memory_clipboard_keeps_last_write() {
        let clipboard = MemoryClipboard::new();
        clipboard.write_text("first").await.unwrap();
        clipboard.write_text("second").await.unwrap();
        assert_eq!(clipboard.contents().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn denying_clipboard_reports_reason() {
        let clipboard = MemoryClipboard::denying("permission denied");
        let err = clipboard.write_text("text").await.unwrap_err();
        assert_eq!(err, ClipboardError::denied("permission denied"));
        assert_eq!(clipboard.contents().await, None);
    }

    #[tokio::test]
    async fn missing_helper_is_unavailable() {
        let clipboard = CommandClipboard::new("ultron-eye-no-such-clipboard-helper", Vec::<String>::new());
        let err = clipboard.write_text("text").await.unwrap_err();
        assert!(matches!(err, ClipboardError::Unavailable { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn helper_exit_status_is_checked() {
        let ok = CommandClipboard::new("cat", Vec::<String>::new());
        ok.write_text("agent:\n").await.unwrap();

        let failing = CommandClipboard::new("false", Vec::<String>::new());
        let err = failing.write_text("agent:\n").await.unwrap_err();
        assert!(matches!(err, ClipboardError::Denied { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn helper_that_stops_reading_is_terminated() {
        let stubborn = CommandClipboard::new("sh", ["-c", "exec 0<&-; sleep 30"]);
        let text = "x".repeat(1 << 20);

        let outcome = tokio::time::timeout(Duration::from_secs(10), stubborn.write_text(&text))
            .await
            .expect("write should not wait for the helper to exit on its own");
        assert!(matches!(outcome, Err(ClipboardError::Denied { .. })));
    }
}
