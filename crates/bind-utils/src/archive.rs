//! ZIP archive writing for EPUB packages.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use zip::read::ZipArchive;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// How a member is stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Stored,
    Deflated,
}

impl Compression {
    fn method(self) -> zip::CompressionMethod {
        match self {
            Compression::Stored => zip::CompressionMethod::Stored,
            Compression::Deflated => zip::CompressionMethod::Deflated,
        }
    }
}

/// Builder for ZIP archives.
///
/// Members are written to a temporary file next to the destination; the
/// destination only appears once [`ZipBuilder::finish`] succeeds. Dropping
/// the builder without finishing removes the temporary file.
pub struct ZipBuilder {
    writer: ZipWriter<NamedTempFile>,
    target: PathBuf,
}

impl ZipBuilder {
    pub fn new(path: &Path) -> io::Result<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        Ok(Self {
            writer: ZipWriter::new(tmp),
            target: path.to_path_buf(),
        })
    }

    /// Add a member with the given compression.
    pub fn add(&mut self, name: &str, content: &[u8], compression: Compression) -> io::Result<()> {
        let options = SimpleFileOptions::default().compression_method(compression.method());
        self.writer.start_file(name, options)?;
        self.writer.write_all(content)?;
        Ok(())
    }

    /// Finish the archive and move it to its destination.
    pub fn finish(self) -> io::Result<()> {
        let tmp = self.writer.finish()?;
        tmp.persist(&self.target)?;
        log::debug!("Archive moved into place at {}", self.target.display());
        Ok(())
    }
}

/// Read a single file from inside a ZIP archive.
pub fn read_zip_entry(zip_path: &Path, entry_name: &str) -> io::Result<Vec<u8>> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut entry = archive.by_name(entry_name)?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

/// List all entries in a ZIP archive, in archive order.
pub fn list_zip_entries(zip_path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(zip_path)?;
    let archive = ZipArchive::new(file)?;
    let entries = (0..archive.len())
        .filter_map(|i| archive.name_for_index(i).map(|s| s.to_string()))
        .collect();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");

        let mut builder = ZipBuilder::new(&path).unwrap();
        builder
            .add("mimetype", b"application/epub+zip", Compression::Stored)
            .unwrap();
        builder
            .add("content.xml", b"<root/>", Compression::Deflated)
            .unwrap();
        assert!(!path.exists());
        builder.finish().unwrap();

        let entries = list_zip_entries(&path).unwrap();
        assert_eq!(entries, vec!["mimetype", "content.xml"]);
        assert_eq!(read_zip_entry(&path, "content.xml").unwrap(), b"<root/>");
    }

    #[test]
    fn test_abandoned_builder_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        {
            let mut builder = ZipBuilder::new(&path).unwrap();
            builder.add("a.txt", b"a", Compression::Deflated).unwrap();
        }
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
