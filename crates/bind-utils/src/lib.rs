//! Shared helpers: archive writing, XML generation, MIME types, decoding.

pub mod archive;
pub mod encoding;
pub mod mime;
pub mod xml;
