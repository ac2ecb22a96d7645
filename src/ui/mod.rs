//! UI components for Richpad

pub mod editor;
pub mod properties;
pub mod recovery;
