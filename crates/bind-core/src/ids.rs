//! Stable identifiers derived from file names.

/// Split a file name into `(stem, extension)`, where the extension keeps its
/// leading dot. Only the final path component is considered, and leading
/// dots of that component never start an extension (`.hidden` has none).
pub fn split_extension(name: &str) -> (&str, &str) {
    let base_start = name.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let base = &name[base_start..];
    let leading_dots = base.len() - base.trim_start_matches('.').len();
    match base[leading_dots..].rfind('.') {
        Some(i) => {
            let dot = base_start + leading_dots + i;
            (&name[..dot], &name[dot..])
        }
        None => (name, ""),
    }
}

/// Lower-cased extension without the dot, or `""`.
pub fn extension_of(name: &str) -> String {
    split_extension(name).1.trim_start_matches('.').to_lowercase()
}

/// Derive the manifest id of a chapter from its file name.
///
/// The id doubles as the chapter's document name inside the package
/// (`<id>.xhtml`).
pub fn make_id(file_name: &str) -> String {
    let (stem, _) = split_extension(file_name);
    stem.to_lowercase().trim().to_string()
}

/// Derive the manifest id of an asset stored under `category/`.
pub fn asset_id(category: &str, file_name: &str) -> String {
    let (stem, _) = split_extension(file_name);
    format!("{}_{}", category, stem).to_lowercase().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("intro.md"), ("intro", ".md"));
        assert_eq!(split_extension("a.b.txt"), ("a.b", ".txt"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension("part.1/intro"), ("part.1/intro", ""));
        assert_eq!(split_extension("part1/ch1.xhtml"), ("part1/ch1", ".xhtml"));
    }

    #[test]
    fn test_make_id() {
        assert_eq!(make_id("Chapter1.md"), "chapter1");
        assert_eq!(make_id(" Intro .markdown"), "intro");
        assert_eq!(make_id("notes"), "notes");
    }

    #[test]
    fn test_make_id_is_normalized_and_idempotent() {
        let names = [
            "Intro.md",
            "  Foreword.txt",
            "APPENDIX A.xhtml",
            "part1/Ch2.markdown",
            "v1.2.notes.md",
        ];
        for name in names {
            let id = make_id(name);
            assert_eq!(id, id.to_lowercase().trim());
            for ext in [".md", ".xhtml", ".txt"] {
                assert_eq!(make_id(&format!("{}{}", id, ext)), id, "{} + {}", name, ext);
            }
        }
    }

    #[test]
    fn test_asset_id() {
        assert_eq!(asset_id("images", "Cover.JPG"), "images_cover");
        assert_eq!(asset_id("styles", "default.css"), "styles_default");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Intro.MD"), "md");
        assert_eq!(extension_of("plain"), "");
    }
}
