use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

/// Storage-addressable identifier of one unit of work
///
/// Identity is the exact string; two equal strings are the same item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRef(String);

impl ItemRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ItemRef {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

impl From<&str> for ItemRef {
    fn from(reference: &str) -> Self {
        Self(reference.to_string())
    }
}

impl AsRef<str> for ItemRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ItemRef {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// An item with its probed size in bytes
///
/// A size of zero is a real (empty) file; unreadable items never become a
/// `SizedItem`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizedItem {
    item_ref: ItemRef,
    size: u64,
}

impl SizedItem {
    pub fn new(item_ref: impl Into<ItemRef>, size: u64) -> Self {
        Self {
            item_ref: item_ref.into(),
            size,
        }
    }

    pub fn item_ref(&self) -> &ItemRef {
        &self.item_ref
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Largest first, ties broken by reference so the order is reproducible
    pub fn cmp_for_balancing(&self, other: &Self) -> Ordering {
        other
            .size
            .cmp(&self.size)
            .then_with(|| self.item_ref.cmp(&other.item_ref))
    }
}
