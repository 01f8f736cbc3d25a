//! Crate-wide error type.
//!
//! Every error carries a process exit code (used by the `wlmass` binary) and a
//! coarse [`ErrorKind`] so that callers can branch on the failure class without
//! parsing messages.
//!
//! Exit codes:
//! - `2`: invalid input or configuration
//! - `3`: required data is missing (membership, derived columns, usable bins)
//! - `4`: computation, solver, or I/O failure

/// Failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed bin specification, out-of-domain coordinates, bad uncertainties.
    InvalidInput,
    /// Parallel arrays of different lengths.
    ShapeMismatch,
    /// Redshift-distribution model requested on a profile built without membership.
    MissingMembership,
    /// Required derived data is absent (e.g. no populated bins to fit).
    MissingColumn,
    /// Least-squares solver failure (non-finite model, singular normal equations).
    Solver,
    /// Reading or writing files.
    Io,
}

impl ErrorKind {
    fn default_exit_code(self) -> u8 {
        match self {
            ErrorKind::InvalidInput | ErrorKind::ShapeMismatch => 2,
            ErrorKind::MissingMembership | ErrorKind::MissingColumn => 3,
            ErrorKind::Solver | ErrorKind::Io => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            exit_code: kind.default_exit_code(),
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ShapeMismatch, message)
    }

    pub fn solver(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Solver, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Check that two parallel arrays have equal length.
pub fn ensure_same_len(what: &str, a: usize, b: usize) -> Result<(), AppError> {
    if a != b {
        return Err(AppError::shape_mismatch(format!(
            "Length mismatch for {what}: {a} != {b}."
        )));
    }
    Ok(())
}
