//! Maps manifest metadata onto OPF Dublin Core records.

use chrono::NaiveDate;

use crate::error::{BindError, Result};
use crate::manifest::{Metadata, MetadataField};

/// Accepted `date` input formats, tried in order.
pub const DATE_FORMATS: &[&str] = &["%B %Y", "%b %Y", "%B, %Y", "%b, %Y", "%Y-%b", "%Y-%m"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `<dc:element>` in the OPF metadata block.
    DublinCore,
    /// `<meta name=".." content=".."/>`.
    Meta,
}

/// One descriptive metadata element, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub kind: RecordKind,
    pub element: String,
    pub attributes: Vec<(String, String)>,
    pub value: String,
}

impl MetadataRecord {
    fn dublin_core(element: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::DublinCore,
            element: element.into(),
            attributes: Vec::new(),
            value: value.into(),
        }
    }

    fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.push((name.to_string(), value.into()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Title, author and identifier kept aside for the navigation document and
/// the wrapper documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookIdentity {
    pub title: String,
    /// Author as written in the manifest (`Last, First`).
    pub author: Option<String>,
    pub uid: String,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct MappedMetadata {
    pub records: Vec<MetadataRecord>,
    pub identity: BookIdentity,
}

/// Inject the identifier and language defaults.
pub fn apply_defaults(metadata: &mut Metadata) {
    if !metadata.contains(&MetadataField::Uuid) && !metadata.contains(&MetadataField::Isbn) {
        let urn = uuid::Uuid::new_v4().urn().to_string();
        log::debug!("No uuid or isbn given, generated {}", urn);
        metadata.insert(MetadataField::Uuid, urn);
    }
    if !metadata.contains(&MetadataField::Language) {
        metadata.insert(MetadataField::Language, "en");
    }
}

/// Produce the metadata records for the package document.
///
/// `cover_id` is the manifest id of the cover image, if the book has one;
/// it is emitted as a `cover` meta hint after every other record.
pub fn map_metadata(metadata: &Metadata, cover_id: Option<&str>) -> Result<MappedMetadata> {
    let mut metadata = metadata.clone();
    apply_defaults(&mut metadata);

    let mut records = Vec::with_capacity(metadata.len() + 1);
    let mut uid: Option<String> = None;

    for (field, value) in metadata.iter() {
        let record = match field {
            MetadataField::Author => person(value, "creator", "aut"),
            MetadataField::Editor => person(value, "contributor", "edt"),
            MetadataField::PublisherPerson => person(value, "contributor", "pbl"),
            MetadataField::Designer => person(value, "contributor", "bkd"),
            MetadataField::Uuid | MetadataField::Isbn => {
                let (scheme, value) = if *field == MetadataField::Isbn {
                    ("ISBN", isbn_urn(value))
                } else {
                    ("UUID", value.to_string())
                };
                let mut record = MetadataRecord::dublin_core("identifier", value.clone());
                // Only one element may carry the package's unique-identifier id.
                if uid.is_none() {
                    record = record.with_attr("id", "bookid");
                    uid = Some(value);
                }
                record.with_attr("scheme", scheme)
            }
            MetadataField::Date => MetadataRecord::dublin_core("date", normalize_date(value)?),
            other => MetadataRecord::dublin_core(other.key(), value),
        };
        records.push(record);
    }

    if let Some(id) = cover_id {
        records.push(MetadataRecord {
            kind: RecordKind::Meta,
            element: "meta".to_string(),
            attributes: vec![
                ("name".to_string(), "cover".to_string()),
                ("content".to_string(), id.to_string()),
            ],
            value: String::new(),
        });
    }

    let title = match metadata.get(&MetadataField::Title) {
        Some(title) => title.to_string(),
        None => {
            log::warn!("Manifest metadata has no title");
            "Untitled".to_string()
        }
    };

    let identity = BookIdentity {
        title,
        author: metadata.get(&MetadataField::Author).map(str::to_string),
        uid: uid.unwrap_or_default(),
        language: metadata
            .get(&MetadataField::Language)
            .unwrap_or("en")
            .to_string(),
    };

    Ok(MappedMetadata { records, identity })
}

fn person(value: &str, element: &str, role: &str) -> MetadataRecord {
    MetadataRecord::dublin_core(element, flip_name(value))
        .with_attr("file-as", value)
        .with_attr("role", role)
}

/// Turn `"Last, First"` into `"First Last"`. Values without a comma are
/// only trimmed.
pub fn flip_name(value: &str) -> String {
    let mut parts = value.split(',');
    let last = parts.next().unwrap_or_default();
    match parts.next() {
        Some(first) => format!("{} {}", first.trim_end(), last.trim_start())
            .trim()
            .to_string(),
        None => value.trim().to_string(),
    }
}

/// Hyphen and dash characters allowed between ISBN digit groups.
const ISBN_SEPARATORS: &[char] = &[
    '-', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}',
];

/// `urn:isbn:` form of an ISBN, with hyphens, dashes and whitespace removed.
pub fn isbn_urn(value: &str) -> String {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !ISBN_SEPARATORS.contains(c))
        .collect();
    if compact
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:"))
    {
        compact
    } else {
        format!("urn:isbn:{}", compact)
    }
}

/// Normalise a publication date to `YYYY-MM`.
pub fn normalize_date(value: &str) -> Result<String> {
    let trimmed = value.trim();
    let with_day = format!("{} 01", trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_day, &format!("{} %d", fmt)).ok())
        .map(|date| date.format("%Y-%m").to_string())
        .ok_or_else(|| BindError::DateFormatUnrecognized(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pairs: &[(&str, &str)]) -> Metadata {
        pairs.iter().copied().collect()
    }

    fn find<'a>(records: &'a [MetadataRecord], element: &str) -> Vec<&'a MetadataRecord> {
        records.iter().filter(|r| r.element == element).collect()
    }

    #[test]
    fn test_author_is_flipped() {
        let mapped = map_metadata(&metadata(&[("author", "Doe, Jane")]), None).unwrap();
        let creator = find(&mapped.records, "creator");
        assert_eq!(creator.len(), 1);
        assert_eq!(creator[0].value, "Jane Doe");
        assert_eq!(creator[0].attr("file-as"), Some("Doe, Jane"));
        assert_eq!(creator[0].attr("role"), Some("aut"));
        assert_eq!(mapped.identity.author.as_deref(), Some("Doe, Jane"));
    }

    #[test]
    fn test_contributor_roles() {
        let mapped = map_metadata(
            &metadata(&[
                ("editor", "Smith, Ann"),
                ("publisher-person", "Roe, Rick"),
                ("designer", "Plain Name"),
            ]),
            None,
        )
        .unwrap();
        let roles: Vec<(&str, &str)> = find(&mapped.records, "contributor")
            .iter()
            .map(|r| (r.attr("role").unwrap(), r.value.as_str()))
            .collect();
        assert_eq!(
            roles,
            vec![("edt", "Ann Smith"), ("pbl", "Rick Roe"), ("bkd", "Plain Name")]
        );
    }

    #[test]
    fn test_flip_name() {
        assert_eq!(flip_name("Doe, Jane"), "Jane Doe");
        assert_eq!(flip_name("  Jane Doe "), "Jane Doe");
        assert_eq!(flip_name("Doe,Jane"), "Jane Doe");
        assert_eq!(flip_name("Doe, Jane, Jr."), "Jane Doe");
    }

    #[test]
    fn test_generated_uuid() {
        let a = map_metadata(&metadata(&[("title", "T")]), None).unwrap();
        let b = map_metadata(&metadata(&[("title", "T")]), None).unwrap();

        let ids_a = find(&a.records, "identifier");
        let ids_b = find(&b.records, "identifier");
        assert_eq!(ids_a.len(), 1);
        assert_eq!(ids_b.len(), 1);
        assert_eq!(ids_a[0].attr("scheme"), Some("UUID"));
        assert_eq!(ids_a[0].attr("id"), Some("bookid"));
        assert!(ids_a[0].value.starts_with("urn:uuid:"));
        assert!(uuid::Uuid::parse_str(&ids_a[0].value["urn:uuid:".len()..]).is_ok());
        assert_ne!(ids_a[0].value, ids_b[0].value);
        assert_eq!(ids_a[0].attributes.len(), ids_b[0].attributes.len());
        assert_eq!(a.identity.uid, ids_a[0].value);
    }

    #[test]
    fn test_isbn() {
        let mapped = map_metadata(&metadata(&[("isbn", "0-13-468599-7")]), None).unwrap();
        let ids = find(&mapped.records, "identifier");
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].value, "urn:isbn:0134685997");
        assert_eq!(ids[0].attr("scheme"), Some("ISBN"));
        assert_eq!(mapped.identity.uid, "urn:isbn:0134685997");
        assert_eq!(isbn_urn("URN:ISBN:0134685997"), "URN:ISBN:0134685997");
    }

    #[test]
    fn test_isbn_with_typographic_dashes() {
        let isbn = "978\u{2013}0\u{2013}13\u{2013}468599\u{2013}1";
        let mapped = map_metadata(&metadata(&[("isbn", isbn)]), None).unwrap();
        assert_eq!(mapped.identity.uid, "urn:isbn:9780134685991");
        assert_eq!(isbn_urn("x\u{e9}\u{e9}"), "urn:isbn:x\u{e9}\u{e9}");
        assert_eq!(isbn_urn("urn"), "urn:isbn:urn");
    }

    #[test]
    fn test_explicit_uuid_kept() {
        let urn = "urn:uuid:7a0b5a3e-8a3a-4a44-a4b2-1b8f4b4f4b4f";
        let mapped = map_metadata(&metadata(&[("uuid", urn)]), None).unwrap();
        assert_eq!(find(&mapped.records, "identifier")[0].value, urn);
    }

    #[test]
    fn test_dates() {
        assert_eq!(normalize_date("March 2020").unwrap(), "2020-03");
        assert_eq!(normalize_date("Mar 2020").unwrap(), "2020-03");
        assert_eq!(normalize_date("March, 2020").unwrap(), "2020-03");
        assert_eq!(normalize_date("2020-Mar").unwrap(), "2020-03");
        assert_eq!(normalize_date("2020-03").unwrap(), "2020-03");
        assert!(matches!(
            normalize_date("2020-13"),
            Err(BindError::DateFormatUnrecognized(_))
        ));
        assert!(normalize_date("sometime").is_err());
    }

    #[test]
    fn test_bad_date_fails_mapping() {
        let err = map_metadata(&metadata(&[("date", "2020-13")]), None).unwrap_err();
        assert_eq!(err.code(), 106);
    }

    #[test]
    fn test_order_and_defaults() {
        let mapped = map_metadata(
            &metadata(&[("title", "T"), ("publisher", "Acme"), ("date", "May 1999")]),
            Some("images_cover"),
        )
        .unwrap();
        let elements: Vec<&str> = mapped.records.iter().map(|r| r.element.as_str()).collect();
        assert_eq!(
            elements,
            vec!["title", "publisher", "date", "identifier", "language", "meta"]
        );
        let cover = mapped.records.last().unwrap();
        assert_eq!(cover.kind, RecordKind::Meta);
        assert_eq!(cover.attr("content"), Some("images_cover"));
        assert_eq!(mapped.identity.language, "en");
        assert_eq!(mapped.identity.title, "T");
    }

    #[test]
    fn test_missing_title_defaults() {
        let mapped = map_metadata(&Metadata::new(), None).unwrap();
        assert_eq!(mapped.identity.title, "Untitled");
        assert!(mapped.identity.author.is_none());
    }

    #[test]
    fn test_uuid_and_isbn_single_bookid() {
        let mapped = map_metadata(
            &metadata(&[("isbn", "0134685997"), ("uuid", "urn:uuid:x")]),
            None,
        )
        .unwrap();
        let with_id: Vec<_> = mapped
            .records
            .iter()
            .filter(|r| r.attr("id") == Some("bookid"))
            .collect();
        assert_eq!(with_id.len(), 1);
        assert_eq!(mapped.identity.uid, "urn:isbn:0134685997");
    }
}
