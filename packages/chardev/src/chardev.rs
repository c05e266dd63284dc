use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::backend::ChardevBackend;
use crate::error::ChardevError;
use crate::opts::ChardevOpts;
use crate::string::StringChardev;

/// Concrete kind of a chardev, carried by every handle
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ChardevKind {
    String,
    Null,
}

impl ChardevKind {
    /// Backend name as used in option strings
    pub fn name(&self) -> &'static str {
        match self {
            ChardevKind::String => "string",
            ChardevKind::Null => "null",
        }
    }
}

impl fmt::Display for ChardevKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChardevKind {
    type Err = ChardevError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ChardevKind::String),
            "null" => Ok(ChardevKind::Null),
            other => Err(ChardevError::UnknownBackend(other.to_string())),
        }
    }
}

/// Per-instance operations the host dispatches to a backend.
///
/// `write` and `sync_read` may be called concurrently from different host
/// threads.
pub trait ChardevDriver: Send + Sync {
    fn kind(&self) -> ChardevKind;

    /// Apply a parsed backend configuration. Returns whether the backend
    /// should be reported as opened to the frontend.
    fn open(&self, backend: &ChardevBackend) -> Result<bool, ChardevError>;

    /// Guest output. Returns the number of bytes accepted.
    fn write(&self, buf: &[u8]) -> Result<usize, ChardevError>;

    /// Pull up to `buf.len()` bytes of guest input. Returns the number copied.
    fn sync_read(&self, buf: &mut [u8]) -> Result<usize, ChardevError>;

    fn as_string(&self) -> Option<&StringChardev> {
        None
    }
}

/// Type-level half of a backend: option parsing and instantiation
pub trait ChardevClass: ChardevDriver + Sized + 'static {
    const KIND: ChardevKind;

    fn parse(opts: &ChardevOpts) -> Result<ChardevBackend, ChardevError>;

    fn instantiate() -> Self;
}

/// Generic handle to an instantiated chardev
pub struct Chardev {
    id: String,
    driver: Box<dyn ChardevDriver>,
    opened: AtomicBool,
}

impl fmt::Debug for Chardev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chardev")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("opened", &self.is_opened())
            .finish()
    }
}

impl Chardev {
    pub fn new(id: impl Into<String>, driver: Box<dyn ChardevDriver>) -> Self {
        Self {
            id: id.into(),
            driver,
            opened: AtomicBool::new(false),
        }
    }

    /// Open (or re-open) the backend with a parsed configuration
    pub fn open(&self, backend: &ChardevBackend) -> Result<(), ChardevError> {
        let be_opened = self.driver.open(backend)?;
        self.opened.store(be_opened, Ordering::SeqCst);
        info!("Opened chardev {} ({}), be_opened={}", self.id, self.kind(), be_opened);
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ChardevKind {
        self.driver.kind()
    }

    /// Whether the backend reported itself opened
    pub fn is_opened(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn write(&self, buf: &[u8]) -> Result<usize, ChardevError> {
        self.driver.write(buf)
    }

    pub fn sync_read(&self, buf: &mut [u8]) -> Result<usize, ChardevError> {
        self.driver.sync_read(buf)
    }

    /// Typed access to a string chardev. Fails if this handle is any other kind.
    pub fn as_string(&self) -> Result<&StringChardev, ChardevError> {
        match (self.kind(), self.driver.as_string()) {
            (ChardevKind::String, Some(string)) => Ok(string),
            (found, _) => Err(ChardevError::WrongKind {
                expected: ChardevKind::String.name(),
                found: found.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::null::NullChardev;

    fn string_backend(text: &str) -> ChardevBackend {
        let opts = ChardevOpts::new("string").with("text", text);
        StringChardev::parse(&opts).unwrap()
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ChardevKind::String.name(), "string");
        assert_eq!("null".parse::<ChardevKind>().unwrap(), ChardevKind::Null);
        assert!(matches!(
            "pty".parse::<ChardevKind>(),
            Err(ChardevError::UnknownBackend(name)) if name == "pty"
        ));
        assert_eq!(ChardevKind::String.to_string(), "string");
    }

    #[test]
    fn test_open_sets_flag() {
        let dev = Chardev::new("c0", Box::new(StringChardev::instantiate()));
        assert!(!dev.is_opened());
        dev.open(&string_backend("hi")).unwrap();
        assert!(dev.is_opened());
        assert_eq!(dev.id(), "c0");
    }

    #[test]
    fn test_typed_access_matches_kind() {
        let dev = Chardev::new("c0", Box::new(StringChardev::instantiate()));
        dev.open(&string_backend("hello")).unwrap();
        let string = dev.as_string().unwrap();
        assert_eq!(string.remaining().unwrap(), 5);
    }

    #[test]
    fn test_typed_access_rejects_other_kind() {
        let dev = Chardev::new("n0", Box::new(NullChardev));
        let err = dev.as_string().unwrap_err();
        assert!(matches!(
            err,
            ChardevError::WrongKind {
                expected: "string",
                found: "null"
            }
        ));
    }

    #[test]
    fn test_open_with_wrong_backend_leaves_unopened() {
        let dev = Chardev::new("c0", Box::new(StringChardev::instantiate()));
        let err = dev
            .open(&ChardevBackend::Null(Default::default()))
            .unwrap_err();
        assert_eq!(err.error_code(), "wrong_kind");
        assert!(!dev.is_opened());
    }
}
