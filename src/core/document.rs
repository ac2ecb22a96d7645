//! Editor buffer backing the text widget, with plain/HTML/RTF file support

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::markup;
use super::text_document::TextDocument;

/// On-disk format family, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Plain,
    Html,
    Rtf,
}

impl DocumentFormat {
    /// `.txt` is plain, `.rtf` is RTF, everything else is treated as HTML
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Self::Plain,
            "rtf" => Self::Rtf,
            _ => Self::Html,
        }
    }

    pub fn is_plain(self) -> bool {
        self == Self::Plain
    }
}

/// The document being edited.
///
/// `content` holds the source in the document's own format: plain text for
/// `.txt`, HTML source for `.html`, RTF source for `.rtf`. The text widget
/// edits it directly.
#[derive(Debug, Clone, Default)]
pub struct EditorBuffer {
    /// File path, `None` until first saved
    pub path: Option<PathBuf>,
    /// Document source
    pub content: String,
    /// Format of `content`
    pub format: DocumentFormat,
    /// Whether the document has unsaved changes
    pub modified: bool,
    revision: u64,
}

impl EditorBuffer {
    /// Create an empty, unsaved document
    pub fn untitled() -> Self {
        Self::default()
    }

    /// Open a document from a file
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            content,
            format: DocumentFormat::from_path(path),
            modified: false,
            revision: 0,
        })
    }

    /// Write the document to its current path
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Document has no file path"))?;

        fs::write(&path, &self.content)
            .with_context(|| format!("Failed to save file: {}", path.display()))?;
        tracing::info!("Saved document: {}", path.display());

        self.modified = false;
        Ok(())
    }

    /// Save under a new path, converting the content to that path's format
    pub fn save_as(&mut self, path: PathBuf) -> Result<()> {
        let format = DocumentFormat::from_path(&path);
        if format != self.format {
            self.convert_to(format);
        }
        self.path = Some(path);
        self.save()
    }

    fn convert_to(&mut self, format: DocumentFormat) {
        let plain = self.plain_text();
        self.content = match format {
            DocumentFormat::Plain => plain,
            DocumentFormat::Html => markup::text_to_html(&plain),
            DocumentFormat::Rtf => markup::text_to_rtf(&plain),
        };
        self.format = format;
        self.mark_changed();
    }

    /// File name for the title bar
    pub fn title(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    /// Record an edit made through the text widget
    pub fn mark_changed(&mut self) {
        self.revision += 1;
        self.modified = true;
    }

    /// Update content and mark as modified
    #[cfg(test)]
    pub fn set_content(&mut self, content: String) {
        if self.content != content {
            self.content = content;
            self.mark_changed();
        }
    }
}

impl TextDocument for EditorBuffer {
    fn plain_text(&self) -> String {
        match self.format {
            DocumentFormat::Plain => self.content.clone(),
            DocumentFormat::Html => markup::html_to_text(&self.content),
            DocumentFormat::Rtf => markup::rtf_to_text(&self.content),
        }
    }

    fn rich_markup(&self) -> String {
        match self.format {
            DocumentFormat::Plain => markup::text_to_html(&self.content),
            DocumentFormat::Html | DocumentFormat::Rtf => self.content.clone(),
        }
    }

    fn set_plain_text(&mut self, text: &str) {
        let content = match self.format {
            DocumentFormat::Plain => text.to_string(),
            DocumentFormat::Html => markup::text_to_html(text),
            DocumentFormat::Rtf => markup::text_to_rtf(text),
        };
        self.content = content;
        self.mark_changed();
    }

    fn set_rich_markup(&mut self, markup: &str) {
        self.content = match self.format {
            DocumentFormat::Plain => markup::html_to_text(markup),
            DocumentFormat::Html | DocumentFormat::Rtf => markup.to_string(),
        };
        self.mark_changed();
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}
