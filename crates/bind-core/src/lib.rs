//! Core model for bookbind: manifest, configuration, metadata mapping and
//! the package structure derived from them.

pub mod book;
pub mod config;
pub mod error;
pub mod ids;
pub mod manifest;
pub mod metadata;
