use std::path::PathBuf;

use thiserror::Error;

/// Every failure that aborts a binding run.
///
/// Each variant carries a stable numeric code (see [`BindError::code`]) used
/// for the `[Err <code>] <message>` report; callers match on the variant,
/// never on the message text.
#[derive(Error, Debug)]
pub enum BindError {
    #[error("File \"{}\" not found.", .0.display())]
    NotFound(PathBuf),

    #[error("\"{}\" must be a directory.", .0.display())]
    NotADirectory(PathBuf),

    #[error("Error reading manifest in {}: {reason}", .dir.display())]
    ManifestUnreadable { dir: PathBuf, reason: String },

    #[error("You must set a source directory.")]
    MissingSource,

    #[error("Unknown file type: {0}")]
    UnrecognizedChapterType(String),

    #[error("Unrecognized date format: {0}")]
    DateFormatUnrecognized(String),

    #[error("Error running '{command}' for {file}: {reason}")]
    ExternalProcessorFailure {
        file: String,
        command: String,
        reason: String,
    },

    #[error("Cannot read chapter {}: {source}", .path.display())]
    ChapterReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Duplicate manifest id \"{id}\" ({first} and {second})")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    #[error("The manifest lists no chapters.")]
    EmptyBook,

    #[error("Stylesheet \"{0}\" not found in the source tree or the style library.")]
    StylesheetNotFound(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BindError {
    /// Stable numeric code for user-facing reports.
    ///
    /// Code 104 belonged to "no manifest loaded"; that state can no longer
    /// be reached (see `Binder`), but the number stays reserved.
    pub fn code(&self) -> u16 {
        match self {
            BindError::NotFound(_) => 100,
            BindError::NotADirectory(_) => 101,
            BindError::ManifestUnreadable { .. } => 102,
            BindError::MissingSource => 103,
            BindError::UnrecognizedChapterType(_) => 105,
            BindError::DateFormatUnrecognized(_) => 106,
            BindError::ExternalProcessorFailure { .. } => 107,
            BindError::ChapterReadFailure { .. } => 108,
            BindError::DuplicateId { .. } => 109,
            BindError::EmptyBook => 110,
            BindError::StylesheetNotFound(_) => 111,
            BindError::Archive(_) => 112,
            BindError::Io(_) => 113,
        }
    }

    /// The `[Err <code>] <message>` form printed by the command line.
    pub fn report(&self) -> String {
        format!("[Err {}] {}", self.code(), self)
    }
}

pub type Result<T> = std::result::Result<T, BindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format() {
        let err = BindError::NotADirectory(PathBuf::from("book.txt"));
        assert_eq!(err.report(), "[Err 101] \"book.txt\" must be a directory.");
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            BindError::NotFound(PathBuf::new()),
            BindError::NotADirectory(PathBuf::new()),
            BindError::ManifestUnreadable {
                dir: PathBuf::new(),
                reason: String::new(),
            },
            BindError::MissingSource,
            BindError::UnrecognizedChapterType(String::new()),
            BindError::DateFormatUnrecognized(String::new()),
            BindError::EmptyBook,
            BindError::StylesheetNotFound(String::new()),
            BindError::Archive(String::new()),
        ];
        let mut codes: Vec<u16> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
