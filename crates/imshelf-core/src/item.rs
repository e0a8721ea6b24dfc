//! Item model: books and DVDs with checkout/return transitions.
//!
//! The loan-state pair (`is_checked_out`, `due_date`) is private; it only
//! changes through [`Item::check_out`] and [`Item::return_item`], which keep
//! the invariant that a checked-out item always carries a due date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidStateError, Result, ValidationError};

/// Identifier for an item within one collection.
///
/// Assigned by the repository; never reused while still present.
pub type ItemId = u32;

/// Due dates use the `YYYY-MM-DD` form everywhere.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate and parse a due date string.
///
/// Shared by checkout and load-time normalization so both accept exactly
/// the same inputs.
pub fn parse_due_date(value: &str) -> std::result::Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::input(
            "Due date must be a non-empty YYYY-MM-DD string",
        ));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ValidationError::input("Due date must follow YYYY-MM-DD format"))
}

/// Which variant a record represents. Serialized as `"Book"` / `"DVD"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Book,
    #[serde(rename = "DVD")]
    Dvd,
}

impl ItemType {
    /// Canonical discriminator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Book => "Book",
            ItemType::Dvd => "DVD",
        }
    }

    /// Parse a discriminator string. Case-sensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Book" => Some(ItemType::Book),
            "DVD" => Some(ItemType::Dvd),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific fields for each kind of holding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Media {
    Book { author: String, pages: u32 },
    Dvd { duration_minutes: u32, rating: u8 },
}

impl Media {
    /// The discriminator this variant serializes under.
    pub fn item_type(&self) -> ItemType {
        match self {
            Media::Book { .. } => ItemType::Book,
            Media::Dvd { .. } => ItemType::Dvd,
        }
    }
}

/// A single library holding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// None until the repository assigns one at add time.
    pub id: Option<ItemId>,
    pub title: String,
    pub media: Media,
    pub(crate) is_checked_out: bool,
    pub(crate) due_date: Option<NaiveDate>,
}

impl Item {
    /// Create an item with the given media, not checked out, id unassigned.
    pub fn new(title: impl Into<String>, media: Media) -> Self {
        Self {
            id: None,
            title: title.into(),
            media,
            is_checked_out: false,
            due_date: None,
        }
    }

    /// Convenience constructor for a book.
    pub fn book(title: impl Into<String>, author: impl Into<String>, pages: u32) -> Self {
        Self::new(
            title,
            Media::Book {
                author: author.into(),
                pages,
            },
        )
    }

    /// Convenience constructor for a DVD.
    pub fn dvd(title: impl Into<String>, duration_minutes: u32, rating: u8) -> Self {
        Self::new(
            title,
            Media::Dvd {
                duration_minutes,
                rating,
            },
        )
    }

    /// The discriminator for this item's variant.
    pub fn item_type(&self) -> ItemType {
        self.media.item_type()
    }

    pub fn is_checked_out(&self) -> bool {
        self.is_checked_out
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Check the item out until `due_date` (`YYYY-MM-DD`).
    ///
    /// Fails with [`InvalidStateError`] when already checked out and with
    /// [`ValidationError`] when the date is empty or malformed; state is
    /// unchanged on failure.
    pub fn check_out(&mut self, due_date: &str) -> Result<()> {
        if self.is_checked_out {
            return Err(InvalidStateError::AlreadyCheckedOut(self.title.clone()).into());
        }
        let due = parse_due_date(due_date)?;
        self.is_checked_out = true;
        self.due_date = Some(due);
        Ok(())
    }

    /// Return the item, clearing the due date.
    ///
    /// Fails with [`InvalidStateError`] when not checked out; state is
    /// unchanged on failure.
    pub fn return_item(&mut self) -> Result<()> {
        if !self.is_checked_out {
            return Err(InvalidStateError::NotCheckedOut(self.title.clone()).into());
        }
        self.is_checked_out = false;
        self.due_date = None;
        Ok(())
    }
}
