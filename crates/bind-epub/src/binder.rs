//! Binding a source directory into an EPUB file.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use bind_content::{resolve_body, ChapterBody};
use bind_core::book::{build_layout, build_navigation, chapter_href, AssetEntry, COVER_HREF};
use bind_core::config::{BinderConfig, Processors};
use bind_core::error::{BindError, Result};
use bind_core::ids::{asset_id, make_id};
use bind_core::manifest::{Chapter, Manifest};
use bind_core::metadata::{map_metadata, BookIdentity, MappedMetadata};
use bind_utils::archive::Compression;
use bind_utils::mime::is_precompressed_media;

use crate::assets::{collect_assets, read_asset, IMAGES_DIR, STYLES_DIR};
use crate::package::{
    content_member, generate_container_xml, Package, CONTAINER_MEMBER, NCX_MEMBER, OPF_MEMBER,
};
use crate::templates::Templates;

/// A binder for one source directory, before its manifest is read.
#[derive(Debug, Clone)]
pub struct Binder {
    source_dir: PathBuf,
    config: BinderConfig,
}

impl Binder {
    pub fn new(source_dir: impl Into<PathBuf>, config: BinderConfig) -> Self {
        Self {
            source_dir: source_dir.into(),
            config,
        }
    }

    /// Check the source directory and read its manifest.
    pub fn load_manifest(self) -> Result<LoadedBinder> {
        validate_source(&self.source_dir)?;
        let manifest = Manifest::load(&self.source_dir)?;
        log::debug!(
            "Manifest lists {} chapters for {}",
            manifest.book.len(),
            self.source_dir.display()
        );
        Ok(LoadedBinder::new(self.source_dir, self.config, manifest))
    }
}

fn validate_source(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(BindError::MissingSource);
    }
    if !dir.exists() {
        return Err(BindError::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(BindError::NotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

/// A binder whose manifest has been read; only this state can build a book.
#[derive(Debug, Clone)]
pub struct LoadedBinder {
    source_dir: PathBuf,
    config: BinderConfig,
    manifest: Manifest,
}

impl LoadedBinder {
    pub fn new(source_dir: impl Into<PathBuf>, config: BinderConfig, manifest: Manifest) -> Self {
        Self {
            source_dir: source_dir.into(),
            config,
            manifest,
        }
    }

    /// Configured processors with the manifest's entries taking precedence.
    pub fn processors(&self) -> Processors {
        self.config.processors.merged_with(&self.manifest.processors)
    }

    /// Manifest id of the cover image, if the book has one.
    pub fn cover_id(&self) -> Option<String> {
        self.manifest
            .cover
            .as_deref()
            .map(|cover| asset_id(IMAGES_DIR, cover))
    }

    /// Metadata records for the package document.
    pub fn generate_metadata(&self) -> Result<MappedMetadata> {
        map_metadata(&self.manifest.metadata, self.cover_id().as_deref())
    }

    pub fn collect_assets(&self) -> Result<Vec<AssetEntry>> {
        collect_assets(
            &self.source_dir,
            self.manifest.stylesheet_name(),
            &self.config.styles,
        )
    }

    /// Default output location: next to the source directory, named after it.
    pub fn default_output_path(&self) -> Result<PathBuf> {
        let dir = match self.source_dir.file_name() {
            Some(_) => self.source_dir.clone(),
            None => fs::canonicalize(&self.source_dir)?,
        };
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "book".to_string());
        Ok(dir.with_file_name(format!("{}.epub", name)))
    }

    /// Build every archive member in memory.
    ///
    /// All chapters are resolved before the first member is produced, so a
    /// failing chapter never leaves a partial package behind.
    pub fn assemble(&self) -> Result<Package> {
        if self.manifest.book.is_empty() {
            return Err(BindError::EmptyBook);
        }

        let templates = Templates::load(&self.config.templates)?;
        let mapped = self.generate_metadata()?;
        let assets = self.collect_assets()?;
        let layout = build_layout(&self.manifest, &assets)?;
        let navigation = build_navigation(&self.manifest.book, &mapped.identity);

        if let Some(cover) = &self.manifest.cover {
            if !assets.iter().any(|a| a.href == format!("{}/{}", IMAGES_DIR, cover)) {
                log::warn!("Cover image {} not found in {}/", cover, IMAGES_DIR);
            }
        }

        let chapters = self.render_chapters(&templates, &mapped.identity)?;
        let asset_data = assets
            .par_iter()
            .map(read_asset)
            .collect::<Result<Vec<_>>>()?;

        let mut package = Package::new();
        package.add(CONTAINER_MEMBER, self.container_xml()?, Compression::Deflated)?;
        package.add(
            OPF_MEMBER,
            templates.render_opf(&mapped.records, &layout),
            Compression::Deflated,
        )?;
        package.add(
            NCX_MEMBER,
            templates.render_ncx(&navigation),
            Compression::Deflated,
        )?;

        for (chapter, document) in self.manifest.book.iter().zip(chapters) {
            let href = chapter_href(&make_id(&chapter.file));
            package.add(content_member(&href), document, Compression::Deflated)?;
        }

        if let Some(cover) = &self.manifest.cover {
            let image = format!("{}/{}", IMAGES_DIR, cover);
            package.add(
                content_member(COVER_HREF),
                templates.render_cover(&image, &mapped.identity),
                Compression::Deflated,
            )?;
        }

        for (asset, data) in assets.iter().zip(asset_data) {
            let compression = if is_precompressed_media(&asset.media_type) {
                Compression::Stored
            } else {
                Compression::Deflated
            };
            package.add(content_member(&asset.href), data, compression)?;
        }

        log::debug!("Assembled {} archive members", package.len());
        Ok(package)
    }

    /// Bind the book and write it to `outfile`, or to
    /// [`default_output_path`](Self::default_output_path) when none is given.
    /// Returns the path written.
    pub fn make_book(&self, outfile: Option<&Path>) -> Result<PathBuf> {
        let output = match outfile {
            Some(path) => path.to_path_buf(),
            None => self.default_output_path()?,
        };
        log::info!(
            "Binding {} into {}",
            self.source_dir.display(),
            output.display()
        );

        let package = self.assemble()?;
        log::info!("Writing EPUB: {}", output.display());
        package.write_to(&output)?;

        log::info!("EPUB written successfully: {}", output.display());
        Ok(output)
    }

    fn render_chapters(&self, templates: &Templates, identity: &BookIdentity) -> Result<Vec<Vec<u8>>> {
        let processors = self.processors();
        // Rendered in parallel; the first failure in book order is reported.
        let rendered: Vec<Result<Vec<u8>>> = self
            .manifest
            .book
            .par_iter()
            .map(|chapter| self.render_chapter(chapter, &processors, templates, identity))
            .collect();
        rendered.into_iter().collect()
    }

    fn render_chapter(
        &self,
        chapter: &Chapter,
        processors: &Processors,
        templates: &Templates,
        identity: &BookIdentity,
    ) -> Result<Vec<u8>> {
        let stylesheet = match &chapter.stylesheet {
            Some(name) => {
                if !self.source_dir.join(STYLES_DIR).join(name).is_file() {
                    log::warn!(
                        "Stylesheet {} for {} is not in {}/",
                        name,
                        chapter.file,
                        STYLES_DIR
                    );
                }
                name.as_str()
            }
            None => self.manifest.stylesheet_name(),
        };

        match resolve_body(&self.source_dir, chapter, processors)? {
            ChapterBody::Document(bytes) => Ok(bytes),
            ChapterBody::Fragment(body) => Ok(templates.render_chapter(
                &body,
                &format!("{}/{}", STYLES_DIR, stylesheet),
                chapter.title.as_deref(),
                identity,
            )),
        }
    }

    fn container_xml(&self) -> Result<Vec<u8>> {
        let path = self.config.static_dir.join("container.xml");
        if path.is_file() {
            log::debug!("Using {}", path.display());
            return Ok(fs::read(&path)?);
        }
        Ok(generate_container_xml().into_bytes())
    }
}
