//! EPUB 2 packaging: collects assets, renders the package documents and
//! writes the archive for a book source directory.

pub mod assets;
mod binder;
pub mod package;
pub mod templates;

pub use binder::{Binder, LoadedBinder};
