//! Host-facing side effects behind a trait so the dispatcher stays testable

use std::fmt;
use std::io::{IsTerminal, Write};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::HookError;

/// How the process is attached to its host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentKind {
    /// Stdin is a pipe; hook payloads arrive on it
    Piped,
    /// Stdin is a terminal; there is no payload to read
    Interactive,
    /// The attachment could not be determined
    Unknown,
}

impl EnvironmentKind {
    /// Classifies the current process by inspecting stdin
    pub fn detect() -> Self {
        if std::io::stdin().is_terminal() {
            EnvironmentKind::Interactive
        } else {
            EnvironmentKind::Piped
        }
    }

    /// Whether it makes sense to block on stdin in this environment
    pub fn can_read_input(self) -> bool {
        !matches!(self, EnvironmentKind::Unknown)
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnvironmentKind::Piped => "piped",
            EnvironmentKind::Interactive => "interactive",
            EnvironmentKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Everything the dispatcher needs from the process environment.
///
/// Production code uses [`OsRuntime`]; tests substitute a recording fake
/// so dispatch decisions can be asserted without touching real stdio.
#[async_trait]
pub trait HookRuntime: Send + Sync {
    /// Environment classification used to gate input reads
    fn environment(&self) -> EnvironmentKind;

    /// Program arguments, without the executable name
    fn args(&self) -> Vec<String>;

    /// Reads the whole hook payload from the host
    async fn read_input(&self) -> Result<String, HookError>;

    /// Looks up an environment variable
    fn env_var(&self, name: &str) -> Option<String>;

    /// Writes one line of output back to the host
    fn write_line(&self, line: &str) -> std::io::Result<()>;

    /// Ends the process with the given exit code
    fn terminate(&self, code: i32);
}

/// The real process environment
#[derive(Debug, Default)]
pub struct OsRuntime;

#[async_trait]
impl HookRuntime for OsRuntime {
    fn environment(&self) -> EnvironmentKind {
        EnvironmentKind::detect()
    }

    fn args(&self) -> Vec<String> {
        std::env::args().skip(1).collect()
    }

    async fn read_input(&self) -> Result<String, HookError> {
        let kind = self.environment();
        if !kind.can_read_input() {
            return Err(HookError::InputUnavailable { kind });
        }
        read_lossy(tokio::io::stdin()).await
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(line.as_bytes())?;
        handle.write_all(b"\n")?;
        handle.flush()
    }

    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Reads a stream to EOF, decoding invalid UTF-8 as replacement
/// characters so an undecodable payload degrades to a JSON decode
/// failure instead of an I/O error
async fn read_lossy<R: AsyncRead + Unpin>(mut reader: R) -> Result<String, HookError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_kind_display() {
        assert_eq!(EnvironmentKind::Piped.to_string(), "piped");
        assert_eq!(EnvironmentKind::Interactive.to_string(), "interactive");
        assert_eq!(EnvironmentKind::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_can_read_input_only_in_known_environments() {
        assert!(EnvironmentKind::Piped.can_read_input());
        assert!(EnvironmentKind::Interactive.can_read_input());
        assert!(!EnvironmentKind::Unknown.can_read_input());
    }

    #[test]
    fn test_detect_never_reports_unknown() {
        assert_ne!(EnvironmentKind::detect(), EnvironmentKind::Unknown);
    }

    #[test]
    fn test_unavailable_input_error_names_environment() {
        let err = HookError::InputUnavailable {
            kind: EnvironmentKind::Unknown,
        };
        assert_eq!(
            err.to_string(),
            "cannot read standard input in unknown environment"
        );
    }

    #[tokio::test]
    async fn test_read_lossy_tolerates_invalid_utf8() {
        let text = read_lossy(&b"\xff\xfe{}"[..]).await.unwrap();
        assert_eq!(text, "\u{FFFD}\u{FFFD}{}");
    }

    #[tokio::test]
    async fn test_read_lossy_passes_valid_utf8_through() {
        let text = read_lossy(&b"{\"session_id\":\"s\"}"[..]).await.unwrap();
        assert_eq!(text, "{\"session_id\":\"s\"}");
    }
}
