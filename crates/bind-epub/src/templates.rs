//! Rendering of the package documents.
//!
//! Each document has a built-in layout with `{{ name }}` placeholders. A
//! file with the same name in the configured templates directory replaces
//! the built-in layout. Repeated parts (metadata elements, manifest items,
//! spine references, navigation points) are generated here and spliced in
//! as ready-made markup, so layouts never need loops.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use bind_core::book::{Navigation, PackageLayout};
use bind_core::error::Result;
use bind_core::metadata::{BookIdentity, MetadataRecord, RecordKind};
use bind_utils::xml::{encode_href, escape_xml_attr, escape_xml_text, XmlBuilder};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    ContentOpf,
    TocNcx,
    Chapter,
    Cover,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::ContentOpf,
        TemplateKind::TocNcx,
        TemplateKind::Chapter,
        TemplateKind::Cover,
    ];

    /// File name of an override in the templates directory.
    pub fn file_name(self) -> &'static str {
        match self {
            TemplateKind::ContentOpf => "content.opf",
            TemplateKind::TocNcx => "toc.ncx",
            TemplateKind::Chapter => "chapter.xhtml",
            TemplateKind::Cover => "cover.xhtml",
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            TemplateKind::ContentOpf => CONTENT_OPF,
            TemplateKind::TocNcx => TOC_NCX,
            TemplateKind::Chapter => CHAPTER_XHTML,
            TemplateKind::Cover => COVER_XHTML,
        }
    }
}

/// Values substituted into a layout. Values are markup and are inserted
/// without further escaping.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    values: HashMap<&'static str, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// The four package layouts, with any overrides already read.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    overrides: HashMap<TemplateKind, String>,
}

impl Templates {
    /// Built-in layouts only.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Read overrides from `dir`. A missing directory or file means the
    /// built-in layout is used.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut overrides = HashMap::new();
        for kind in TemplateKind::ALL {
            let path = dir.join(kind.file_name());
            if path.is_file() {
                log::info!("Using template {}", path.display());
                overrides.insert(kind, std::fs::read_to_string(&path)?);
            }
        }
        Ok(Self { overrides })
    }

    pub fn is_overridden(&self, kind: TemplateKind) -> bool {
        self.overrides.contains_key(&kind)
    }

    /// Render a layout with the given context, as UTF-8 bytes.
    pub fn render(&self, kind: TemplateKind, context: &TemplateContext) -> Vec<u8> {
        let layout = self
            .overrides
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.builtin());

        PLACEHOLDER
            .replace_all(layout, |caps: &Captures| {
                let key = &caps[1];
                match context.get(key) {
                    Some(value) => value.to_string(),
                    None => {
                        log::warn!("Template {} uses unknown value '{}'", kind.file_name(), key);
                        String::new()
                    }
                }
            })
            .into_owned()
            .into_bytes()
    }

    /// The OPF package document.
    pub fn render_opf(&self, records: &[MetadataRecord], layout: &PackageLayout) -> Vec<u8> {
        let context = TemplateContext::new()
            .set("metadata", metadata_fragment(records))
            .set("manifest", manifest_fragment(layout))
            .set("spine", spine_fragment(layout))
            .set("guide", guide_fragment(layout));
        self.render(TemplateKind::ContentOpf, &context)
    }

    /// The NCX navigation document.
    pub fn render_ncx(&self, navigation: &Navigation) -> Vec<u8> {
        let author = match &navigation.author {
            Some(author) => {
                let mut xml = XmlBuilder::fragment(1);
                xml.open_tag("docAuthor", &[])
                    .text_element("text", author, &[])
                    .close_tag("docAuthor");
                xml.build()
            }
            None => String::new(),
        };
        let context = TemplateContext::new()
            .set("uid", escape_xml_attr(&navigation.uid))
            .set("title", escape_xml_text(&navigation.title))
            .set("author", author)
            .set("navmap", navmap_fragment(navigation));
        self.render(TemplateKind::TocNcx, &context)
    }

    /// Wrap a chapter body in the chapter layout.
    pub fn render_chapter(
        &self,
        body: &str,
        stylesheet: &str,
        title: Option<&str>,
        identity: &BookIdentity,
    ) -> Vec<u8> {
        let context = TemplateContext::new()
            .set("content", body)
            .set("stylesheet", escape_xml_attr(&encode_href(stylesheet)))
            .set("title", escape_xml_text(title.unwrap_or(&identity.title)))
            .set("language", escape_xml_attr(&identity.language));
        self.render(TemplateKind::Chapter, &context)
    }

    /// The cover wrapper page around `image` (package-relative path).
    pub fn render_cover(&self, image: &str, identity: &BookIdentity) -> Vec<u8> {
        let context = TemplateContext::new()
            .set("image", escape_xml_attr(&encode_href(image)))
            .set("title", escape_xml_text(&identity.title))
            .set("alt", escape_xml_attr(&identity.title))
            .set("language", escape_xml_attr(&identity.language));
        self.render(TemplateKind::Cover, &context)
    }
}

fn metadata_fragment(records: &[MetadataRecord]) -> String {
    let mut xml = XmlBuilder::fragment(2);
    for record in records {
        match record.kind {
            RecordKind::DublinCore => {
                let element = format!("dc:{}", record.element);
                let names: Vec<String> = record
                    .attributes
                    .iter()
                    .map(|(name, _)| {
                        if name == "id" {
                            name.clone()
                        } else {
                            format!("opf:{}", name)
                        }
                    })
                    .collect();
                let attrs: Vec<(&str, &str)> = names
                    .iter()
                    .zip(&record.attributes)
                    .map(|(name, (_, value))| (name.as_str(), value.as_str()))
                    .collect();
                xml.text_element(&element, &record.value, &attrs);
            }
            RecordKind::Meta => {
                let attrs: Vec<(&str, &str)> = record
                    .attributes
                    .iter()
                    .map(|(n, v)| (n.as_str(), v.as_str()))
                    .collect();
                xml.empty_tag(&record.element, &attrs);
            }
        }
    }
    xml.build()
}

fn manifest_fragment(layout: &PackageLayout) -> String {
    let mut xml = XmlBuilder::fragment(2);
    for item in layout.manifest.iter() {
        let href = encode_href(&item.href);
        xml.empty_tag(
            "item",
            &[
                ("id", item.id.as_str()),
                ("href", href.as_str()),
                ("media-type", item.media_type.as_str()),
            ],
        );
    }
    xml.build()
}

fn spine_fragment(layout: &PackageLayout) -> String {
    let mut xml = XmlBuilder::fragment(2);
    for item in layout.spine.iter() {
        xml.empty_tag("itemref", &[("idref", item.idref.as_str())]);
    }
    xml.build()
}

fn guide_fragment(layout: &PackageLayout) -> String {
    if layout.guide.is_empty() {
        return String::new();
    }
    let mut xml = XmlBuilder::fragment(1);
    xml.open_tag("guide", &[]);
    for reference in &layout.guide {
        let href = encode_href(&reference.href);
        xml.empty_tag(
            "reference",
            &[
                ("type", reference.ref_type.as_str()),
                ("title", reference.title.as_str()),
                ("href", href.as_str()),
            ],
        );
    }
    xml.close_tag("guide");
    xml.build()
}

fn navmap_fragment(navigation: &Navigation) -> String {
    let mut xml = XmlBuilder::fragment(2);
    for point in &navigation.points {
        let play_order = point.play_order.to_string();
        let href = encode_href(&point.href);
        xml.open_tag(
            "navPoint",
            &[("id", point.id.as_str()), ("playOrder", play_order.as_str())],
        )
        .open_tag("navLabel", &[])
        .text_element("text", &point.title, &[])
        .close_tag("navLabel")
        .empty_tag("content", &[("src", href.as_str())])
        .close_tag("navPoint");
    }
    xml.build()
}

const CONTENT_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="bookid" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
{{ metadata }}  </metadata>
  <manifest>
{{ manifest }}  </manifest>
  <spine toc="ncx">
{{ spine }}  </spine>
{{ guide }}</package>
"#;

const TOC_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{{ uid }}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{{ title }}</text>
  </docTitle>
{{ author }}  <navMap>
{{ navmap }}  </navMap>
</ncx>
"#;

const CHAPTER_XHTML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{{ language }}">
<head>
  <title>{{ title }}</title>
  <link rel="stylesheet" type="text/css" href="{{ stylesheet }}"/>
</head>
<body>
{{ content }}
</body>
</html>
"#;

const COVER_XHTML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{{ language }}">
<head>
  <title>{{ title }}</title>
  <style type="text/css">
    body { margin: 0; padding: 0; text-align: center; }
    img { max-width: 100%; max-height: 100%; }
  </style>
</head>
<body>
  <div class="cover"><img src="{{ image }}" alt="{{ alt }}"/></div>
</body>
</html>
"#;
