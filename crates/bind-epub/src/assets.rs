//! Collection of the non-chapter files bundled with a book.

use std::fs;
use std::io;
use std::path::Path;

use bind_core::book::{AssetEntry, AssetSource};
use bind_core::error::{BindError, Result};
use bind_core::ids::{asset_id, extension_of};
use bind_core::manifest::DEFAULT_STYLESHEET;
use bind_utils::mime::mime_from_extension;

pub const IMAGES_DIR: &str = "images";
pub const STYLES_DIR: &str = "styles";
pub const ASSETS_DIR: &str = "assets";

/// Source subdirectories scanned for assets, in package order.
pub const ASSET_CATEGORIES: [&str; 3] = [IMAGES_DIR, STYLES_DIR, ASSETS_DIR];

/// Stylesheet used when neither the book nor the style library provides
/// `default.css`.
pub const DEFAULT_CSS: &str = r#"body {
  margin: 0 5%;
  font-family: serif;
  line-height: 1.4;
  text-align: justify;
}

h1, h2, h3, h4, h5, h6 {
  font-family: sans-serif;
  text-align: left;
  page-break-after: avoid;
}

h1 {
  margin-top: 2em;
  font-size: 1.6em;
}

p {
  margin: 0;
  text-indent: 1.2em;
}

h1 + p, h2 + p, h3 + p, blockquote p {
  text-indent: 0;
}

blockquote {
  margin: 1em 2em;
  font-style: italic;
}

pre, code {
  font-family: monospace;
  font-size: 0.9em;
}

pre {
  white-space: pre-wrap;
  text-align: left;
}

img {
  max-width: 100%;
}

table {
  border-collapse: collapse;
  margin: 1em auto;
}

th, td {
  border: 1px solid #888;
  padding: 0.2em 0.5em;
}

.cover {
  text-align: center;
}
"#;

/// Gather the book's assets.
///
/// If the effective stylesheet is missing from `styles/` in the source, it
/// comes first, taken from `style_library` (or the built-in default
/// stylesheet). Then every regular file of `images/`, `styles/` and
/// `assets/` follows, category by category, sorted by name. Hidden files
/// and subdirectories are skipped; missing or unreadable directories
/// contribute nothing.
pub fn collect_assets(
    source_dir: &Path,
    stylesheet: &str,
    style_library: &Path,
) -> Result<Vec<AssetEntry>> {
    let mut assets = Vec::new();

    if !source_dir.join(STYLES_DIR).join(stylesheet).is_file() {
        assets.push(library_stylesheet(stylesheet, style_library)?);
    }

    for category in ASSET_CATEGORIES {
        let dir = source_dir.join(category);
        if !dir.is_dir() {
            continue;
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                log::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) if name.starts_with('.') => {}
                Some(name) => names.push(name.to_string()),
                None => log::warn!("Skipping asset with non-UTF-8 name: {}", path.display()),
            }
        }
        names.sort();

        for name in names {
            let media_type = mime_from_extension(&extension_of(&name));
            assets.push(AssetEntry {
                id: asset_id(category, &name),
                href: format!("{}/{}", category, name),
                media_type: media_type.to_string(),
                source: AssetSource::File(dir.join(&name)),
            });
        }
    }

    log::debug!("Collected {} assets", assets.len());
    Ok(assets)
}

fn library_stylesheet(name: &str, style_library: &Path) -> Result<AssetEntry> {
    let path = style_library.join(name);
    let source = if path.is_file() {
        log::debug!("Using stylesheet {}", path.display());
        AssetSource::File(path)
    } else if name == DEFAULT_STYLESHEET {
        log::debug!("Using built-in {}", DEFAULT_STYLESHEET);
        AssetSource::Builtin(DEFAULT_CSS)
    } else {
        return Err(BindError::StylesheetNotFound(name.to_string()));
    };

    Ok(AssetEntry {
        id: asset_id(STYLES_DIR, name),
        href: format!("{}/{}", STYLES_DIR, name),
        media_type: mime_from_extension("css").to_string(),
        source,
    })
}

/// Read an asset's bytes.
pub fn read_asset(asset: &AssetEntry) -> Result<Vec<u8>> {
    match &asset.source {
        AssetSource::File(path) => fs::read(path).map_err(|e| {
            BindError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        }),
        AssetSource::Builtin(text) => Ok(text.as_bytes().to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn touch(path: PathBuf) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_collect_in_category_order() {
        let src = tempfile::tempdir().unwrap();
        touch(src.path().join("styles/default.css"));
        touch(src.path().join("styles/extra.css"));
        touch(src.path().join("images/b.png"));
        touch(src.path().join("images/A.JPG"));
        touch(src.path().join("images/.DS_Store"));
        touch(src.path().join("images/nested/c.png"));
        touch(src.path().join("assets/font.ttf"));

        let assets = collect_assets(src.path(), "default.css", Path::new("/nonexistent")).unwrap();
        let hrefs: Vec<&str> = assets.iter().map(|a| a.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec![
                "images/A.JPG",
                "images/b.png",
                "styles/default.css",
                "styles/extra.css",
                "assets/font.ttf",
            ]
        );
        assert_eq!(assets[0].id, "images_a");
        assert_eq!(assets[0].media_type, "image/jpeg");
        assert_eq!(assets[4].id, "assets_font");
        assert_eq!(assets[4].media_type, "application/x-font-ttf");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_category_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let src = tempfile::tempdir().unwrap();
        touch(src.path().join("images/cover.png"));
        touch(src.path().join("assets/font.ttf"));
        let images = src.path().join("images");
        fs::set_permissions(&images, fs::Permissions::from_mode(0o000)).unwrap();
        // Root can still list the directory.
        let still_readable = fs::read_dir(&images).is_ok();

        let result = collect_assets(src.path(), "default.css", Path::new("/nonexistent"));
        fs::set_permissions(&images, fs::Permissions::from_mode(0o755)).unwrap();

        let assets = result.unwrap();
        let hrefs: Vec<&str> = assets.iter().map(|a| a.href.as_str()).collect();
        assert!(hrefs.contains(&"assets/font.ttf"));
        if !still_readable {
            assert_eq!(hrefs, vec!["styles/default.css", "assets/font.ttf"]);
        }
    }

    #[test]
    fn test_builtin_default_stylesheet() {
        let src = tempfile::tempdir().unwrap();
        let assets = collect_assets(src.path(), "default.css", Path::new("/nonexistent")).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "styles_default");
        assert_eq!(assets[0].href, "styles/default.css");
        assert_eq!(assets[0].media_type, "text/css");
        assert_eq!(assets[0].source, AssetSource::Builtin(DEFAULT_CSS));
    }

    #[test]
    fn test_stylesheet_from_library() {
        let src = tempfile::tempdir().unwrap();
        let library = tempfile::tempdir().unwrap();
        fs::write(library.path().join("fancy.css"), "p {}").unwrap();
        touch(src.path().join("images/cover.png"));

        let assets = collect_assets(src.path(), "fancy.css", library.path()).unwrap();
        assert_eq!(assets[0].id, "styles_fancy");
        assert_eq!(
            assets[0].source,
            AssetSource::File(library.path().join("fancy.css"))
        );
        assert_eq!(read_asset(&assets[0]).unwrap(), b"p {}");
        assert_eq!(assets[1].href, "images/cover.png");
    }

    #[test]
    fn test_unknown_stylesheet() {
        let src = tempfile::tempdir().unwrap();
        let err = collect_assets(src.path(), "missing.css", Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, BindError::StylesheetNotFound(ref n) if n == "missing.css"));
    }

    #[test]
    fn test_read_missing_asset_names_path() {
        let asset = AssetEntry {
            id: "images_gone".to_string(),
            href: "images/gone.png".to_string(),
            media_type: "image/png".to_string(),
            source: AssetSource::File(PathBuf::from("/nonexistent/gone.png")),
        };
        let err = read_asset(&asset).unwrap_err();
        assert!(err.to_string().contains("gone.png"));
    }
}
