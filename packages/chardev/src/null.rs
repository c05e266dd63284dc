use crate::backend::{ChardevBackend, ChardevCommon};
use crate::chardev::{ChardevClass, ChardevDriver, ChardevKind};
use crate::error::ChardevError;
use crate::opts::ChardevOpts;

/// Discards output and never produces input
#[derive(Clone, Copy, Debug, Default)]
pub struct NullChardev;

impl ChardevDriver for NullChardev {
    fn kind(&self) -> ChardevKind {
        ChardevKind::Null
    }

    fn open(&self, backend: &ChardevBackend) -> Result<bool, ChardevError> {
        match backend {
            ChardevBackend::Null(_) => Ok(false),
            other => Err(ChardevError::WrongKind {
                expected: ChardevKind::Null.name(),
                found: other.kind().name(),
            }),
        }
    }

    fn write(&self, buf: &[u8]) -> Result<usize, ChardevError> {
        Ok(buf.len())
    }

    fn sync_read(&self, _buf: &mut [u8]) -> Result<usize, ChardevError> {
        Ok(0)
    }
}

impl ChardevClass for NullChardev {
    const KIND: ChardevKind = ChardevKind::Null;

    fn parse(opts: &ChardevOpts) -> Result<ChardevBackend, ChardevError> {
        Ok(ChardevBackend::Null(ChardevCommon::parse(opts)?))
    }

    fn instantiate() -> Self {
        NullChardev
    }
}
