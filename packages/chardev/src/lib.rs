//! Chardev - string-backed virtual character devices
//!
//! This crate provides a character device backend that feeds a fixed text
//! string to a guest serial port as if it were incoming data, and passes
//! guest output through to a diagnostic sink (stderr by default).
//!
//! The host side is kept deliberately small: a [`ChardevRegistry`] that knows
//! which backend types exist, a [`Chardev`] handle the host dispatches I/O
//! through, and QEMU-style option parsing via [`ChardevOpts`].
//!
//! # Example
//!
//! ```no_run
//! use chardev::{ChardevOpts, ChardevRegistry};
//!
//! fn main() -> Result<(), chardev::ChardevError> {
//!     let registry = ChardevRegistry::with_builtin_types()?;
//!
//!     let opts = ChardevOpts::parse("string,id=serial0,text=hello")?;
//!     let dev = registry.create(&opts)?;
//!
//!     let mut buf = [0u8; 3];
//!     let n = dev.sync_read(&mut buf)?;
//!     assert_eq!(&buf[..n], b"hel");
//!
//!     // Guest output goes to stderr
//!     dev.write(b"ping")?;
//!     Ok(())
//! }
//! ```

pub mod backend;
mod chardev;
pub mod config;
mod error;
mod null;
pub mod opts;
mod registry;
pub mod sink;
mod string;

pub use backend::{ChardevBackend, ChardevCommon, ChardevString};
pub use chardev::{Chardev, ChardevClass, ChardevDriver, ChardevKind};
pub use error::ChardevError;
pub use null::NullChardev;
pub use opts::ChardevOpts;
pub use registry::{ChardevRegistry, ChardevType};
pub use sink::{DiagnosticSink, StderrSink};
pub use string::StringChardev;
