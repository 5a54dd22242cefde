//! Package structure derived from a manifest: the OPF file manifest, the
//! spine, the guide and the NCX navigation map.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{BindError, Result};
use crate::ids::make_id;
use crate::manifest::{Chapter, Manifest};
use crate::metadata::BookIdentity;

pub const NCX_ID: &str = "ncx";
pub const NCX_HREF: &str = "toc.ncx";
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";
pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";
pub const COVER_ID: &str = "cover";
pub const COVER_HREF: &str = "cover.xhtml";

/// Package-relative document name of a chapter.
pub fn chapter_href(id: &str) -> String {
    format!("{}.xhtml", id)
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// A non-chapter file bundled into the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub id: String,
    /// Path relative to the package content directory (`images/cover.jpg`).
    pub href: String,
    pub media_type: String,
    pub source: AssetSource,
}

/// Where an asset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    File(PathBuf),
    Builtin(&'static str),
}

// ---------------------------------------------------------------------------
// File manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
}

impl ManifestItem {
    pub fn new(
        id: impl Into<String>,
        href: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
        }
    }
}

/// Ordered OPF manifest with unique ids.
#[derive(Debug, Clone, Default)]
pub struct FileManifest {
    items: Vec<ManifestItem>,
    id_index: HashMap<String, usize>,
}

impl FileManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item. Fails if its id is already taken.
    pub fn add(&mut self, item: ManifestItem) -> Result<()> {
        if let Some(&idx) = self.id_index.get(&item.id) {
            return Err(BindError::DuplicateId {
                id: item.id,
                first: self.items[idx].href.clone(),
                second: item.href,
            });
        }
        self.id_index.insert(item.id.clone(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    pub fn by_id(&self, id: &str) -> Option<&ManifestItem> {
        self.id_index.get(id).map(|&idx| &self.items[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Spine and guide
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub idref: String,
}

/// Linear reading order.
#[derive(Debug, Clone, Default)]
pub struct Spine {
    items: Vec<SpineItem>,
}

impl Spine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, idref: impl Into<String>) {
        self.items.push(SpineItem {
            idref: idref.into(),
        });
    }

    pub fn insert(&mut self, index: usize, idref: impl Into<String>) {
        self.items.insert(
            index,
            SpineItem {
                idref: idref.into(),
            },
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpineItem> {
        self.items.iter()
    }

    pub fn idrefs(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.idref.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideRef {
    pub ref_type: String,
    pub title: String,
    pub href: String,
}

/// Everything the package document lists besides its metadata.
#[derive(Debug, Clone, Default)]
pub struct PackageLayout {
    pub manifest: FileManifest,
    pub spine: Spine,
    pub guide: Vec<GuideRef>,
}

/// Build the OPF manifest, spine and guide.
///
/// Manifest order: navigation control file, chapters in book order, cover
/// wrapper, assets. The spine lists chapters in book order with the cover
/// wrapper first when there is one.
pub fn build_layout(manifest: &Manifest, assets: &[AssetEntry]) -> Result<PackageLayout> {
    let mut layout = PackageLayout::default();
    layout
        .manifest
        .add(ManifestItem::new(NCX_ID, NCX_HREF, NCX_MEDIA_TYPE))?;

    for chapter in &manifest.book {
        let id = make_id(&chapter.file);
        layout
            .manifest
            .add(ManifestItem::new(&id, chapter_href(&id), XHTML_MEDIA_TYPE))
            .map_err(|e| match e {
                BindError::DuplicateId { id, first, .. } => BindError::DuplicateId {
                    id,
                    first,
                    second: chapter.file.clone(),
                },
                other => other,
            })?;
        layout.spine.push(id);
    }

    if manifest.cover.is_some() {
        layout
            .manifest
            .add(ManifestItem::new(COVER_ID, COVER_HREF, XHTML_MEDIA_TYPE))?;
        layout.spine.insert(0, COVER_ID);
        layout.guide.push(GuideRef {
            ref_type: "cover".to_string(),
            title: "Cover".to_string(),
            href: COVER_HREF.to_string(),
        });
    }

    for asset in assets {
        layout.manifest.add(ManifestItem::new(
            &asset.id,
            &asset.href,
            &asset.media_type,
        ))?;
    }

    Ok(layout)
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub id: String,
    pub href: String,
    pub title: String,
    pub play_order: u32,
}

/// NCX contents: book identity plus a flat navigation map.
#[derive(Debug, Clone)]
pub struct Navigation {
    pub title: String,
    pub author: Option<String>,
    pub uid: String,
    pub points: Vec<NavPoint>,
}

/// Build the table of contents from the chapter list.
///
/// Chapters without a title or marked non-linear are left out; the rest
/// keep book order.
pub fn build_navigation(chapters: &[Chapter], identity: &BookIdentity) -> Navigation {
    let points = chapters
        .iter()
        .filter(|chapter| chapter.in_navigation())
        .zip(1..)
        .map(|(chapter, play_order)| {
            let id = make_id(&chapter.file);
            NavPoint {
                href: chapter_href(&id),
                title: chapter.title.clone().unwrap_or_default(),
                id,
                play_order,
            }
        })
        .collect();

    Navigation {
        title: identity.title.clone(),
        author: identity.author.clone(),
        uid: identity.uid.clone(),
        points,
    }
}
