//! Core functionality: documents, markup conversion, recovery and properties

pub mod config;
pub mod document;
pub mod error;
pub mod manager;
pub mod markup;
pub mod properties;
pub mod recovery;
pub mod schedule;
pub mod text_document;
