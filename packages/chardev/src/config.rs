//! Chardev definitions loaded from a TOML file and the environment.
//!
//! ```toml
//! [[chardev]]
//! id = "serial0"
//! backend = "string"
//! text = "root\n"
//! outputdev = "mon0"
//! ```
//!
//! File entries are turned into [`ChardevOpts`] so they go through the same
//! backend parsers as `--chardev` arguments.

use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::opts::ChardevOpts;

/// Top-level configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub chardev: Vec<ChardevSpec>,
}

/// One `[[chardev]]` table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChardevSpec {
    pub id: String,
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub outputdev: Option<String>,
    #[serde(default)]
    pub logfile: Option<String>,
    #[serde(default)]
    pub logappend: Option<bool>,
}

fn default_backend() -> String {
    "string".to_string()
}

impl ChardevSpec {
    /// Convert to an option set. A missing `text` is left missing so the
    /// backend parser reports it.
    pub fn to_opts(&self) -> ChardevOpts {
        let mut opts = ChardevOpts::new(&self.backend).with("id", &self.id);
        if let Some(text) = &self.text {
            opts.set("text", text);
        }
        if let Some(outputdev) = &self.outputdev {
            opts.set("outputdev", outputdev);
        }
        if let Some(logfile) = &self.logfile {
            opts.set("logfile", logfile);
        }
        if let Some(logappend) = self.logappend {
            opts.set("logappend", if logappend { "on" } else { "off" });
        }
        opts
    }
}

impl FileConfig {
    pub fn to_opts(&self) -> Vec<ChardevOpts> {
        self.chardev.iter().map(ChardevSpec::to_opts).collect()
    }
}

/// Build a figment that layers: defaults → TOML file → CHARDEV_* env vars.
///
/// Env vars use double-underscore for nesting.
pub fn load_config(path: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(FileConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed("CHARDEV_").split("__"))
}

/// Load and extract the configuration, failing if an explicit file is missing
pub fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        info!("Loading chardev config from {}", path.display());
    }

    load_config(path)
        .extract()
        .context("Failed to parse chardev configuration")
}
