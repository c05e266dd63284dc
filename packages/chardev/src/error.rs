use std::io;

/// Errors that can occur while configuring or driving a chardev
#[derive(Debug, thiserror::Error)]
pub enum ChardevError {
    /// Malformed option string
    #[error("invalid chardev options: {0}")]
    Opts(String),

    /// Backend options parsed but are unusable (e.g. missing `text`)
    #[error("{0}")]
    Config(String),

    /// No registered type handles this backend name
    #[error("chardev: unknown backend: {0}")]
    UnknownBackend(String),

    /// A type with this name is already registered
    #[error("chardev: type already registered: {0}")]
    DuplicateType(String),

    /// Device creation requires an `id` option
    #[error("chardev: no id specified")]
    MissingId,

    /// A device with this id already exists
    #[error("chardev: duplicate id: {0}")]
    DuplicateId(String),

    /// No device with this id
    #[error("chardev not found: {0}")]
    NotFound(String),

    /// Typed access or open with a backend of another kind
    #[error("chardev is of kind {found}, expected {expected}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },

    /// Read attempted before the device was opened
    #[error("chardev has not been opened")]
    NotOpened,

    /// The diagnostic sink rejected a write
    #[error("sink write failed: {0}")]
    SinkWrite(#[from] io::Error),
}

impl ChardevError {
    pub fn error_code(&self) -> &str {
        match self {
            Self::Opts(_) => "invalid_opts",
            Self::Config(_) => "configuration_error",
            Self::UnknownBackend(_) => "unknown_backend",
            Self::DuplicateType(_) => "duplicate_type",
            Self::MissingId => "missing_id",
            Self::DuplicateId(_) => "duplicate_id",
            Self::NotFound(_) => "not_found",
            Self::WrongKind { .. } => "wrong_kind",
            Self::NotOpened => "not_opened",
            Self::SinkWrite(_) => "sink_write_failure",
        }
    }
}
