//! Chapter content resolution: picks a processing branch from the chapter's
//! file extension and produces its markup.

pub mod markdown;
pub mod processor;
pub mod smarten;

use std::path::Path;

use bind_core::config::Processors;
use bind_core::error::{BindError, Result};
use bind_core::ids::extension_of;
use bind_core::manifest::Chapter;
use bind_utils::encoding::decode_to_utf8;

/// Extensions converted by the built-in Markdown pipeline.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Extension of chapters copied into the package as-is.
pub const XHTML_EXTENSION: &str = "xhtml";

/// Processing branch for a chapter, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterKind<'a> {
    /// A configured external command (template) produces the body.
    External(&'a str),
    Markdown,
    /// A complete document used verbatim.
    Xhtml,
}

/// Result of resolving a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterBody {
    /// Body markup still to be wrapped in the chapter template.
    Fragment(String),
    /// A complete document, packaged without wrapping.
    Document(Vec<u8>),
}

/// Choose the processing branch for `file`.
pub fn classify<'a>(file: &str, processors: &'a Processors) -> Result<ChapterKind<'a>> {
    let ext = extension_of(file);
    if let Some(command) = processors.get(&ext) {
        return Ok(ChapterKind::External(command));
    }
    if MARKDOWN_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(ChapterKind::Markdown);
    }
    if ext == XHTML_EXTENSION {
        return Ok(ChapterKind::Xhtml);
    }
    Err(BindError::UnrecognizedChapterType(file.to_string()))
}

/// Produce a chapter's markup.
///
/// `processors` is the merged configuration- and manifest-level table.
pub fn resolve_body(
    source_dir: &Path,
    chapter: &Chapter,
    processors: &Processors,
) -> Result<ChapterBody> {
    match classify(&chapter.file, processors)? {
        ChapterKind::External(command) => {
            log::debug!("Processing {} with '{}'", chapter.file, command);
            let html = processor::run_processor(command, &chapter.file, source_dir)?;
            Ok(ChapterBody::Fragment(html))
        }
        ChapterKind::Markdown => {
            log::debug!("Converting {} from Markdown", chapter.file);
            let bytes = read_chapter(source_dir, &chapter.file)?;
            let (text, encoding) = decode_to_utf8(&bytes);
            if encoding != "UTF-8" {
                log::debug!("{} decoded as {}", chapter.file, encoding);
            }
            let html = markdown::markdown_to_html(&text);
            Ok(ChapterBody::Fragment(smarten::smarten(&html)))
        }
        ChapterKind::Xhtml => {
            log::debug!("Using {} as-is", chapter.file);
            Ok(ChapterBody::Document(read_chapter(source_dir, &chapter.file)?))
        }
    }
}

fn read_chapter(source_dir: &Path, file: &str) -> Result<Vec<u8>> {
    let path = source_dir.join(file);
    std::fs::read(&path).map_err(|source| BindError::ChapterReadFailure { path, source })
}
