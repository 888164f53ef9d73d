use serde::{Deserialize, Serialize};

pub use super::entity::Model as Book;

/// Request model for creating a new book.
///
/// Missing fields decode as empty strings; creation does not check for
/// non-empty values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewBook {
    /// Title of the book
    #[serde(default)]
    pub name: String,
    /// Author of the book
    #[serde(default)]
    pub author: String,
    /// Publisher of the book
    #[serde(default)]
    pub publication: String,
}

/// Request model for a partial update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub publication: Option<String>,
}

impl BookChanges {
    /// Overwrite each field of `book` for which a non-empty value was supplied.
    ///
    /// Returns whether anything changed.
    pub fn apply_to(self, book: &mut Book) -> bool {
        let mut changed = false;
        for (incoming, current) in [
            (self.name, &mut book.name),
            (self.author, &mut book.author),
            (self.publication, &mut book.publication),
        ] {
            if let Some(value) = incoming.filter(|value| !value.is_empty()) {
                changed |= *current != value;
                *current = value;
            }
        }
        changed
    }
}
