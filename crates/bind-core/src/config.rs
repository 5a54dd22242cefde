//! Binder configuration: library locations and external processors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the installed support files live.
pub const DEFAULT_LIBRARY: &str = "/usr/local/lib/bookbind";

/// Configuration passed into the binder at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Static files copied verbatim (`container.xml`).
    #[serde(rename = "static")]
    pub static_dir: PathBuf,
    /// Template overrides.
    pub templates: PathBuf,
    /// Style library used when a stylesheet is missing from the source tree.
    pub styles: PathBuf,
    /// File extension → external command template.
    pub processors: Processors,
}

impl Default for BinderConfig {
    fn default() -> Self {
        let library = Path::new(DEFAULT_LIBRARY);
        Self {
            static_dir: library.join("static"),
            templates: library.join("templates"),
            styles: library.join("styles"),
            processors: Processors::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl BinderConfig {
    /// Load a TOML configuration file. Keys missing from the file keep
    /// their defaults.
    pub fn load(path: &Path) -> std::result::Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Extension → command template table.
///
/// Keys are normalised to lower case without a leading dot, so `.md`, `MD`
/// and `md` all name the same processor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct Processors {
    commands: BTreeMap<String, String>,
}

impl Processors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, extension: &str, command: impl Into<String>) {
        self.commands
            .insert(normalize_extension(extension), command.into());
    }

    /// Command template registered for `extension`, if any.
    pub fn get(&self, extension: &str) -> Option<&str> {
        self.commands
            .get(&normalize_extension(extension))
            .map(String::as_str)
    }

    /// Combine two tables; entries of `overrides` win on collision.
    pub fn merged_with(&self, overrides: &Processors) -> Processors {
        let mut commands = self.commands.clone();
        for (ext, command) in &overrides.commands {
            commands.insert(ext.clone(), command.clone());
        }
        Processors { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl From<BTreeMap<String, String>> for Processors {
    fn from(map: BTreeMap<String, String>) -> Self {
        let mut processors = Processors::new();
        for (ext, command) in map {
            processors.insert(&ext, command);
        }
        processors
    }
}

impl From<Processors> for BTreeMap<String, String> {
    fn from(processors: Processors) -> Self {
        processors.commands
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}
