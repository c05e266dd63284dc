//! Parsed backend descriptors handed from the parse step to `open`.

use crate::chardev::ChardevKind;
use crate::error::ChardevError;
use crate::opts::ChardevOpts;

/// Options shared by every backend type
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChardevCommon {
    pub logfile: Option<String>,
    pub logappend: Option<bool>,
}

impl ChardevCommon {
    /// Extract the common options from an option set
    pub fn parse(opts: &ChardevOpts) -> Result<Self, ChardevError> {
        Ok(Self {
            logfile: opts.get("logfile").map(str::to_string),
            logappend: opts.get_bool("logappend")?,
        })
    }
}

/// Configuration for a string chardev
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChardevString {
    pub common: ChardevCommon,
    /// Text served to sync reads
    pub text: String,
    /// Downstream device name. Recorded only, nothing is forwarded to it.
    pub outputdev: Option<String>,
}

/// A configured backend, tagged by kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChardevBackend {
    String(ChardevString),
    Null(ChardevCommon),
}

impl ChardevBackend {
    pub fn kind(&self) -> ChardevKind {
        match self {
            ChardevBackend::String(_) => ChardevKind::String,
            ChardevBackend::Null(_) => ChardevKind::Null,
        }
    }

    pub fn common(&self) -> &ChardevCommon {
        match self {
            ChardevBackend::String(string) => &string.common,
            ChardevBackend::Null(common) => common,
        }
    }
}
