//! The editable document as seen by the recovery store

use std::cell::RefCell;
use std::rc::Rc;

/// Content access the store needs from whatever widget holds the text
pub trait TextDocument {
    /// Current content rendered as plain text
    fn plain_text(&self) -> String;

    /// Current content serialized as rich markup
    fn rich_markup(&self) -> String;

    /// Replace the content from plain text
    fn set_plain_text(&mut self, text: &str);

    /// Replace the content from rich markup
    fn set_rich_markup(&mut self, markup: &str);

    /// Change counter, bumped on every content modification
    fn revision(&self) -> u64;
}

/// Handle to the active document, shared between the UI and the store
pub type SharedDocument = Rc<RefCell<dyn TextDocument>>;
