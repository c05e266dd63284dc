//! String chardev: serves a fixed text as guest input.
//!
//! The text comes from the `text` option and is consumed front to back by
//! [`ChardevDriver::sync_read`]. Once it is used up every read returns zero
//! bytes. Guest output is passed straight through to a [`DiagnosticSink`],
//! stderr unless another sink is injected.
//!
//! An `outputdev` option is accepted and recorded, but output is never
//! forwarded to that device.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};

use crate::backend::{ChardevBackend, ChardevCommon, ChardevString};
use crate::chardev::{ChardevClass, ChardevDriver, ChardevKind};
use crate::error::ChardevError;
use crate::opts::ChardevOpts;
use crate::sink::{DiagnosticSink, StderrSink};

/// Text and read position, present once the device is opened
struct StringSource {
    text: Box<[u8]>,
    cursor: usize,
    outputdev: Option<String>,
}

impl StringSource {
    fn new(config: &ChardevString) -> Self {
        // C-string semantics: the text ends at the first NUL
        let bytes = config.text.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Self {
            text: bytes[..end].into(),
            cursor: 0,
            outputdev: config.outputdev.clone(),
        }
    }

    fn remaining(&self) -> usize {
        self.text.len() - self.cursor
    }
}

pub struct StringChardev {
    source: Mutex<Option<StringSource>>,
    sink: Box<dyn DiagnosticSink>,
}

impl Default for StringChardev {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringChardev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.lock();
        f.debug_struct("StringChardev")
            .field("opened", &source.is_some())
            .field("cursor", &source.as_ref().map(|s| s.cursor))
            .field("len", &source.as_ref().map(|s| s.text.len()))
            .finish()
    }
}

impl StringChardev {
    /// Create an unopened string chardev writing to stderr
    pub fn new() -> Self {
        Self::with_sink(StderrSink)
    }

    /// Create an unopened string chardev writing to `sink`
    pub fn with_sink(sink: impl DiagnosticSink + 'static) -> Self {
        Self {
            source: Mutex::new(None),
            sink: Box::new(sink),
        }
    }

    // The guarded state is a plain offset that is consistent between
    // statements, so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Option<StringSource>> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bytes left before the source is exhausted
    pub fn remaining(&self) -> Result<usize, ChardevError> {
        self.lock()
            .as_ref()
            .map(StringSource::remaining)
            .ok_or(ChardevError::NotOpened)
    }

    /// Offset of the next unread byte
    pub fn position(&self) -> Result<usize, ChardevError> {
        self.lock()
            .as_ref()
            .map(|s| s.cursor)
            .ok_or(ChardevError::NotOpened)
    }

    pub fn is_exhausted(&self) -> Result<bool, ChardevError> {
        Ok(self.remaining()? == 0)
    }

    /// Source text as configured at the last open
    pub fn text(&self) -> Result<Vec<u8>, ChardevError> {
        self.lock()
            .as_ref()
            .map(|s| s.text.to_vec())
            .ok_or(ChardevError::NotOpened)
    }

    /// Configured `outputdev`, if any
    pub fn output_device_name(&self) -> Option<String> {
        self.lock().as_ref().and_then(|s| s.outputdev.clone())
    }
}

impl ChardevDriver for StringChardev {
    fn kind(&self) -> ChardevKind {
        ChardevKind::String
    }

    fn open(&self, backend: &ChardevBackend) -> Result<bool, ChardevError> {
        let ChardevBackend::String(config) = backend else {
            return Err(ChardevError::WrongKind {
                expected: ChardevKind::String.name(),
                found: backend.kind().name(),
            });
        };

        if let Some(outputdev) = &config.outputdev {
            warn!(
                "string chardev: outputdev '{}' is recorded but output forwarding is not implemented",
                outputdev
            );
        }

        let source = StringSource::new(config);
        debug!("string chardev: opened with {} bytes of text", source.text.len());
        *self.lock() = Some(source);

        Ok(true)
    }

    fn write(&self, buf: &[u8]) -> Result<usize, ChardevError> {
        let written = self.sink.write(buf).map_err(|e| {
            warn!("string chardev: sink write of {} bytes failed: {}", buf.len(), e);
            ChardevError::SinkWrite(e)
        })?;
        debug!("string chardev: write {} gives {}", buf.len(), written);
        Ok(written)
    }

    fn sync_read(&self, buf: &mut [u8]) -> Result<usize, ChardevError> {
        let len = {
            let mut guard = self.lock();
            let source = guard.as_mut().ok_or(ChardevError::NotOpened)?;

            let len = buf.len().min(source.remaining());
            let start = source.cursor;
            buf[..len].copy_from_slice(&source.text[start..start + len]);
            source.cursor += len;
            len
        };

        trace!("string chardev: sync_read giving {} bytes", len);
        Ok(len)
    }

    fn as_string(&self) -> Option<&StringChardev> {
        Some(self)
    }
}

impl ChardevClass for StringChardev {
    const KIND: ChardevKind = ChardevKind::String;

    fn parse(opts: &ChardevOpts) -> Result<ChardevBackend, ChardevError> {
        let common = ChardevCommon::parse(opts)?;

        let text = opts
            .get("text")
            .ok_or_else(|| ChardevError::Config("chardev: No text given for string chardev".into()))?
            .to_string();
        let outputdev = opts.get("outputdev").map(str::to_string);

        Ok(ChardevBackend::String(ChardevString {
            common,
            text,
            outputdev,
        }))
    }

    fn instantiate() -> Self {
        Self::new()
    }
}
