//! The author-supplied manifest: metadata, chapter list, cover, stylesheet.

use std::fmt;
use std::path::Path;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::config::Processors;
use crate::error::{BindError, Result};

/// Manifest file names tried in the source directory, in order.
pub const MANIFEST_FILES: &[&str] = &["manifest.yaml", "manifest.yml", "manifest.toml"];

/// Stylesheet used when neither the chapter nor the manifest names one.
pub const DEFAULT_STYLESHEET: &str = "default.css";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub book: Vec<Chapter>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub stylesheet: Option<String>,
    #[serde(default)]
    pub processors: Processors,
}

impl Manifest {
    /// Read the manifest from `source_dir`, trying each of [`MANIFEST_FILES`].
    pub fn load(source_dir: &Path) -> Result<Self> {
        let unreadable = |reason: String| BindError::ManifestUnreadable {
            dir: source_dir.to_path_buf(),
            reason,
        };

        let path = MANIFEST_FILES
            .iter()
            .map(|name| source_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| unreadable(format!("none of {} found", MANIFEST_FILES.join(", "))))?;

        log::debug!("Reading manifest {}", path.display());
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| unreadable(format!("{}: {}", path.display(), e)))?;

        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        let manifest = if is_toml {
            Self::from_toml_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
        .map_err(|e| unreadable(format!("{}: {}", path.display(), e)))?;

        if manifest.book.is_empty() {
            return Err(BindError::EmptyBook);
        }
        Ok(manifest)
    }

    pub fn from_yaml_str(s: &str) -> std::result::Result<Self, String> {
        serde_yaml::from_str(s).map_err(|e| e.to_string())
    }

    pub fn from_toml_str(s: &str) -> std::result::Result<Self, String> {
        toml::from_str(s).map_err(|e| e.to_string())
    }

    /// Book-wide stylesheet name.
    pub fn stylesheet_name(&self) -> &str {
        self.stylesheet.as_deref().unwrap_or(DEFAULT_STYLESHEET)
    }
}

/// One entry of the manifest's `book` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chapter {
    pub file: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub title: Option<String>,
    /// `false` keeps the chapter in the reading order but out of the
    /// table of contents.
    #[serde(default = "default_linear", deserialize_with = "yaml_bool")]
    pub linear: bool,
    #[serde(default)]
    pub stylesheet: Option<String>,
}

impl Chapter {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            title: None,
            linear: true,
            stylesheet: None,
        }
    }

    pub fn titled(file: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::new(file)
        }
    }

    /// Whether the chapter gets a table-of-contents entry.
    pub fn in_navigation(&self) -> bool {
        self.title.is_some() && self.linear
    }
}

fn default_linear() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Metadata keys with special handling; anything else is carried through
/// under its own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Title,
    Author,
    Editor,
    PublisherPerson,
    Designer,
    Uuid,
    Isbn,
    Date,
    Language,
    Other(String),
}

impl MetadataField {
    pub fn from_key(key: &str) -> Self {
        match key {
            "title" => Self::Title,
            "author" => Self::Author,
            "editor" => Self::Editor,
            "publisher-person" => Self::PublisherPerson,
            "designer" => Self::Designer,
            "uuid" => Self::Uuid,
            "isbn" => Self::Isbn,
            "date" => Self::Date,
            "language" => Self::Language,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Editor => "editor",
            Self::PublisherPerson => "publisher-person",
            Self::Designer => "designer",
            Self::Uuid => "uuid",
            Self::Isbn => "isbn",
            Self::Date => "date",
            Self::Language => "language",
            Self::Other(key) => key,
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The manifest's metadata mapping, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(MetadataField, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, keeping its position when it already exists.
    pub fn insert(&mut self, field: MetadataField, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: &MetadataField) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, field: &MetadataField) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetadataField, &str)> {
        self.entries.iter().map(|(f, v)| (f, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (key, value) in iter {
            metadata.insert(MetadataField::from_key(key.as_ref()), value);
        }
        metadata
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MetadataVisitor;

        impl<'de> Visitor<'de> for MetadataVisitor {
            type Value = Metadata;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of metadata fields")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Metadata, E> {
                Ok(Metadata::new())
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Metadata, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut metadata = Metadata::new();
                while let Some((key, value)) = map.next_entry::<String, Scalar>()? {
                    metadata.insert(MetadataField::from_key(&key), value.0);
                }
                Ok(metadata)
            }
        }

        deserializer.deserialize_any(MetadataVisitor)
    }
}

/// Any scalar value, kept as its string form (an unquoted ISBN arrives as
/// an integer).
struct Scalar(String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

fn optional_scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|s| s.0))
}

/// A boolean in any YAML 1.1 spelling (`yes`/`no`, `on`/`off`,
/// `true`/`false`, any case).
fn yaml_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let Scalar(value) = Scalar::deserialize(deserializer)?;
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => Err(de::Error::invalid_value(
            de::Unexpected::Str(&value),
            &"a boolean (true/false, yes/no, on/off)",
        )),
    }
}
