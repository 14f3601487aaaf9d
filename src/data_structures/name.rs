//! Case-insensitive resource names.
//!
//! Model archives, texture tables and placement lists all refer to the same
//! resources with inconsistent casing. Every lookup key in the crate goes
//! through [`ResourceName`] so the folding rule lives in exactly one place.

use std::{borrow::Borrow, fmt};

/// A lower-cased resource name usable as a map key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(raw: &str) -> Self {
        Self(normalize_name(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Folds a raw name into its lookup form.
pub fn normalize_name(raw: &str) -> String {
    raw.to_lowercase()
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<&String> for ResourceName {
    fn from(raw: &String) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ResourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
