//! The in-memory EPUB package and its ZIP serialization.

use std::collections::HashSet;
use std::path::Path;

use bind_core::error::{BindError, Result};
use bind_utils::archive::{Compression, ZipBuilder};
use bind_utils::xml::XmlBuilder;

pub const MIMETYPE_MEMBER: &str = "mimetype";
pub const EPUB_MIMETYPE: &str = "application/epub+zip";
pub const CONTAINER_MEMBER: &str = "META-INF/container.xml";
/// Directory holding the package document and all content.
pub const CONTENT_DIR: &str = "OEBPS";
pub const OPF_MEMBER: &str = "OEBPS/content.opf";
pub const NCX_MEMBER: &str = "OEBPS/toc.ncx";

/// Path of a content file inside the archive.
pub fn content_member(href: &str) -> String {
    format!("{}/{}", CONTENT_DIR, href)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMember {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: Compression,
}

/// Ordered archive members. The `mimetype` member is always first and
/// stored uncompressed; member names are unique.
#[derive(Debug, Clone)]
pub struct Package {
    members: Vec<PackageMember>,
    names: HashSet<String>,
}

impl Package {
    pub fn new() -> Self {
        let mut package = Self {
            members: Vec::new(),
            names: HashSet::new(),
        };
        package.names.insert(MIMETYPE_MEMBER.to_string());
        package.members.push(PackageMember {
            name: MIMETYPE_MEMBER.to_string(),
            data: EPUB_MIMETYPE.as_bytes().to_vec(),
            compression: Compression::Stored,
        });
        package
    }

    /// Append a member after those already added.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        data: Vec<u8>,
        compression: Compression,
    ) -> Result<()> {
        let name = name.into();
        if !self.names.insert(name.clone()) {
            return Err(BindError::Archive(format!(
                "{} would be written twice",
                name
            )));
        }
        self.members.push(PackageMember {
            name,
            data,
            compression,
        });
        Ok(())
    }

    pub fn members(&self) -> &[PackageMember] {
        &self.members
    }

    pub fn get(&self, name: &str) -> Option<&PackageMember> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Write the archive to `path`. Nothing appears at `path` unless every
    /// member was written.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut zip = ZipBuilder::new(path)
            .map_err(|e| BindError::Archive(format!("Failed to create {}: {}", path.display(), e)))?;

        for member in &self.members {
            zip.add(&member.name, &member.data, member.compression)
                .map_err(|e| BindError::Archive(format!("Failed to write {}: {}", member.name, e)))?;
        }

        zip.finish()
            .map_err(|e| BindError::Archive(format!("Failed to finalize {}: {}", path.display(), e)))?;
        Ok(())
    }
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}

/// The OCF container document pointing at the package document.
pub fn generate_container_xml() -> String {
    let mut xml = XmlBuilder::new();
    xml.open_tag(
        "container",
        &[
            ("version", "1.0"),
            ("xmlns", "urn:oasis:names:tc:opendocument:xmlns:container"),
        ],
    )
    .open_tag("rootfiles", &[])
    .empty_tag(
        "rootfile",
        &[
            ("full-path", OPF_MEMBER),
            ("media-type", "application/oebps-package+xml"),
        ],
    )
    .close_tag("rootfiles")
    .close_tag("container");
    xml.build()
}
