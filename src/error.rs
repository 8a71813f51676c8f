// src/error.rs
use std::fmt;

/// Why the console stopped handing out input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEnd {
    /// SIGINT (Ctrl-C) was received.
    Interrupted,
    /// stdin reached end of file.
    Closed,
}

/// Failure returned by a menu action.
///
/// The dispatcher decides what each variant means for the session:
/// `Failed` is logged and the menu comes back, `Fatal` ends the session with
/// a failure status, `Aborted` ends it the same way the matching console
/// event would.
#[derive(Debug)]
pub enum ActionError {
    Failed(anyhow::Error),
    Fatal(anyhow::Error),
    Aborted(InputEnd),
}

impl ActionError {
    pub fn failed(err: impl Into<anyhow::Error>) -> Self {
        ActionError::Failed(err.into())
    }

    pub fn fatal(err: impl Into<anyhow::Error>) -> Self {
        ActionError::Fatal(err.into())
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Failed(e) | ActionError::Fatal(e) => write!(f, "{:#}", e),
            ActionError::Aborted(InputEnd::Interrupted) => f.write_str("interrupted by user"),
            ActionError::Aborted(InputEnd::Closed) => f.write_str("input closed"),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActionError::Failed(e) | ActionError::Fatal(e) => Some(e.as_ref()),
            ActionError::Aborted(_) => None,
        }
    }
}

/// Unexpected I/O faults are soft failures unless an action says otherwise.
impl From<std::io::Error> for ActionError {
    fn from(err: std::io::Error) -> Self {
        ActionError::Failed(err.into())
    }
}

impl From<InputEnd> for ActionError {
    fn from(end: InputEnd) -> Self {
        ActionError::Aborted(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn display_includes_context_chain() {
        let inner: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"));
        let err = ActionError::fatal(inner.context("reading /etc/passwd").unwrap_err());
        assert_eq!(err.to_string(), "reading /etc/passwd: no such file");
    }

    #[test]
    fn io_errors_are_soft() {
        let err: ActionError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, ActionError::Failed(_)));
    }
}
