/// Substring search across the visible columns.
use crate::model::display::contains_ignore_case;
use crate::model::{DeviceItem, PropertyClass};

/// A non-empty, lower-cased search needle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    raw: String,
    needle: String,
}

impl SearchTerm {
    /// `None` for an empty or whitespace-only term (no filtering).
    pub fn new(term: &str) -> Option<Self> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            raw: term.to_owned(),
            needle: trimmed.to_lowercase(),
        })
    }

    /// The term as the user typed it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `true` if the needle occurs in the display text of any of `columns`.
    /// Invalid and empty properties never match.
    pub fn matches(&self, item: &DeviceItem, columns: &[PropertyClass]) -> bool {
        columns.iter().any(|&class| {
            // The name column shows the resolved display name.
            let text = if class == PropertyClass::Name {
                item.name()
            } else {
                let prop = item.property(class);
                if !prop.is_valid() {
                    return false;
                }
                prop.as_str()
            };
            !text.is_empty() && contains_ignore_case(text, &self.needle)
        })
    }
}
