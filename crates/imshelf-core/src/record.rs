//! The flat wire form of an item, as stored in the items file.
//!
//! Records carry both the canonical and legacy names for the discriminator
//! (`item_type` / `type`) and the DVD duration (`duration` /
//! `duration_minutes`), so files written by older versions keep loading and
//! files written here keep opening there.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::item::{Item, ItemId, ItemType, Media};

fn default_title() -> String {
    "Untitled".to_string()
}

/// One persisted item row.
///
/// Variant-specific fields are optional so a single record type covers both
/// variants; `skip_serializing_if` keeps each written row to its own
/// variant's keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub is_checked_out: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Canonical discriminator.
    #[serde(default)]
    pub item_type: Option<ItemType>,
    /// Legacy alias for the discriminator, kept in sync when writing.
    #[serde(rename = "type", default)]
    pub legacy_type: Option<ItemType>,

    // Book fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,

    // DVD fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Legacy alias for the duration, kept in sync when writing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl ItemRecord {
    /// Discriminator resolved from the canonical name, then the legacy one.
    pub fn resolved_type(&self) -> Option<ItemType> {
        self.item_type.or(self.legacy_type)
    }

    /// Duration resolved from the canonical name, then the legacy one.
    pub fn resolved_duration(&self) -> Option<u32> {
        self.duration.or(self.duration_minutes)
    }
}

impl Item {
    /// Flatten into the persisted form.
    ///
    /// Lossless: round-trips through [`Item::from_record`] to an equal item.
    pub fn to_record(&self) -> ItemRecord {
        let item_type = self.item_type();
        let (author, pages, duration, rating) = match &self.media {
            Media::Book { author, pages } => (Some(author.clone()), Some(*pages), None, None),
            Media::Dvd {
                duration_minutes,
                rating,
            } => (None, None, Some(*duration_minutes), Some(*rating)),
        };
        ItemRecord {
            id: self.id,
            title: self.title.clone(),
            is_checked_out: self.is_checked_out,
            due_date: self.due_date,
            item_type: Some(item_type),
            legacy_type: Some(item_type),
            author,
            pages,
            duration,
            duration_minutes: duration,
            rating,
        }
    }

    /// Rebuild an item from its persisted form.
    ///
    /// Missing optional fields take defaults: title "Untitled" (applied at
    /// deserialization), author "Unknown", pages and duration 1, rating 3.
    /// Fails only when the discriminator is missing or unknown; the union is
    /// closed, so there is no untyped fallback shape.
    pub fn from_record(record: &ItemRecord) -> std::result::Result<Item, ValidationError> {
        let item_type = record
            .resolved_type()
            .ok_or_else(|| ValidationError::input("type must be one of Book, DVD"))?;
        let media = match item_type {
            ItemType::Book => Media::Book {
                author: record
                    .author
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                pages: record.pages.unwrap_or(1),
            },
            ItemType::Dvd => Media::Dvd {
                duration_minutes: record.resolved_duration().unwrap_or(1),
                rating: record.rating.unwrap_or(3),
            },
        };
        Ok(Item {
            id: record.id,
            title: record.title.clone(),
            media,
            is_checked_out: record.is_checked_out,
            due_date: record.due_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_round_trip() {
        let mut book = Item::book("1984", "George Orwell", 328);
        book.id = Some(7);
        let back = Item::from_record(&book.to_record()).unwrap();
        assert_eq!(book, back);
    }

    #[test]
    fn dvd_round_trip_including_loan_state() {
        let mut dvd = Item::dvd("Inception", 148, 4);
        dvd.id = Some(2);
        dvd.check_out("2025-01-15").unwrap();
        let back = Item::from_record(&dvd.to_record()).unwrap();
        assert_eq!(dvd, back);
        assert!(back.is_checked_out());
    }

    #[test]
    fn written_records_carry_both_aliases() {
        let mut dvd = Item::dvd("Inception", 148, 4);
        dvd.id = Some(1);
        let json = serde_json::to_value(dvd.to_record()).unwrap();

        assert_eq!(json["item_type"], "DVD");
        assert_eq!(json["type"], "DVD");
        assert_eq!(json["duration"], 148);
        assert_eq!(json["duration_minutes"], 148);
        assert_eq!(json["rating"], 4);
    }

    #[test]
    fn book_records_omit_dvd_fields() {
        let book = Item::book("1984", "George Orwell", 328);
        let json = serde_json::to_value(book.to_record()).unwrap();

        assert_eq!(json["author"], "George Orwell");
        assert_eq!(json["pages"], 328);
        assert!(json.get("duration").is_none());
        assert!(json.get("duration_minutes").is_none());
        assert!(json.get("rating").is_none());
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let record: ItemRecord = serde_json::from_str(r#"{"item_type": "Book", "id": 1}"#).unwrap();
        let item = Item::from_record(&record).unwrap();

        assert_eq!(item.title, "Untitled");
        assert_eq!(
            item.media,
            Media::Book {
                author: "Unknown".to_string(),
                pages: 1
            }
        );
        assert!(!item.is_checked_out());
    }

    #[test]
    fn dvd_defaults() {
        let record: ItemRecord = serde_json::from_str(r#"{"type": "DVD"}"#).unwrap();
        let item = Item::from_record(&record).unwrap();
        assert_eq!(
            item.media,
            Media::Dvd {
                duration_minutes: 1,
                rating: 3
            }
        );
    }

    #[test]
    fn legacy_only_fields_resolve() {
        let record: ItemRecord =
            serde_json::from_str(r#"{"type": "DVD", "title": "Alien", "duration_minutes": 117, "rating": 5}"#)
                .unwrap();
        assert_eq!(record.resolved_type(), Some(ItemType::Dvd));
        assert_eq!(record.resolved_duration(), Some(117));

        let item = Item::from_record(&record).unwrap();
        assert_eq!(
            item.media,
            Media::Dvd {
                duration_minutes: 117,
                rating: 5
            }
        );
    }

    #[test]
    fn missing_discriminator_is_rejected() {
        let record: ItemRecord = serde_json::from_str(r#"{"title": "Mystery"}"#).unwrap();
        let err = Item::from_record(&record).unwrap_err();
        assert!(err.to_string().contains("Book, DVD"));
    }

    #[test]
    fn serde_round_trip_preserves_due_date() {
        let mut book = Item::book("Dune", "Frank Herbert", 412);
        book.id = Some(3);
        book.check_out("2025-06-01").unwrap();

        let json = serde_json::to_string(&book.to_record()).unwrap();
        let record: ItemRecord = serde_json::from_str(&json).unwrap();
        let back = Item::from_record(&record).unwrap();
        assert_eq!(book, back);
    }
}
