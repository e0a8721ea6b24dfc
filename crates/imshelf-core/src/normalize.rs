//! Strict validation of raw loaded rows.
//!
//! Every failure names the offending field, and rows are numbered from 1 in
//! messages. Normalization runs before rows become typed items, so a single
//! bad row rejects the whole load and hands control to the repository's
//! corruption recovery.

use serde_json::Value;

use crate::error::ValidationError;
use crate::item::{parse_due_date, ItemType};
use crate::record::ItemRecord;

use chrono::NaiveDate;

type Result<T> = std::result::Result<T, ValidationError>;

/// Normalize a whole loaded document into wire records.
///
/// A JSON `null` or empty-string document is treated as an empty store;
/// anything else must be an array of records.
pub fn normalize_rows(document: &Value) -> Result<Vec<ItemRecord>> {
    match document {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::Array(rows) => rows
            .iter()
            .enumerate()
            .map(|(index, row)| normalize_row(row, index))
            .collect(),
        _ => Err(ValidationError::input(
            "Items JSON must contain a list of records",
        )),
    }
}

/// Normalize one raw row at 0-based `index` into a validated record.
///
/// Rules run in a fixed order: object shape, `id`, `title`,
/// `is_checked_out`, `due_date`, discriminator, then variant fields.
pub fn normalize_row(row: &Value, index: usize) -> Result<ItemRecord> {
    let row_no = index + 1;
    let obj = match row.as_object() {
        Some(obj) => obj,
        None => return Err(ValidationError::NotAnObject(row_no)),
    };

    let id = require_positive_int(obj.get("id"), "id", row_no)?;
    let title = require_string(obj.get("title"), "title", row_no)?;
    let is_checked_out = require_bool(obj.get("is_checked_out"), row_no)?;
    let due_date = require_date_or_none(obj.get("due_date"), row_no)?;
    let item_type = resolve_item_type(obj.get("item_type"), obj.get("type"), row_no)?;

    let mut record = ItemRecord {
        id: Some(id),
        title,
        is_checked_out,
        due_date,
        item_type: Some(item_type),
        legacy_type: Some(item_type),
        author: None,
        pages: None,
        duration: None,
        duration_minutes: None,
        rating: None,
    };

    match item_type {
        ItemType::Book => {
            record.author = Some(require_string(obj.get("author"), "author", row_no)?);
            record.pages = Some(require_positive_int(obj.get("pages"), "pages", row_no)?);
        }
        ItemType::Dvd => {
            let duration_source = obj.get("duration").or_else(|| obj.get("duration_minutes"));
            let duration = require_positive_int(duration_source, "duration", row_no)?;
            record.duration = Some(duration);
            record.duration_minutes = Some(duration);
            record.rating = Some(require_rating(obj.get("rating"), row_no)?);
        }
    }

    Ok(record)
}

fn require_string(value: Option<&Value>, field: &str, row: usize) -> Result<String> {
    let s = value
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::row(row, format!("{field} must be a string")))?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::row(row, format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn require_bool(value: Option<&Value>, row: usize) -> Result<bool> {
    value
        .and_then(Value::as_bool)
        .ok_or_else(|| ValidationError::row(row, "is_checked_out must be true or false"))
}

/// Coerce integers, integral parts of floats, and integer strings; anything
/// else fails. The range check gets its own message.
fn require_positive_int(value: Option<&Value>, field: &str, row: usize) -> Result<u32> {
    let coercion_err = || ValidationError::row(row, format!("{field} must be a positive integer"));
    let number: i64 = match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64() {
                f.trunc() as i64
            } else {
                return Err(coercion_err());
            }
        }
        Some(Value::String(s)) => s.trim().parse().map_err(|_| coercion_err())?,
        _ => return Err(coercion_err()),
    };
    if number <= 0 {
        return Err(ValidationError::row(
            row,
            format!("{field} must be greater than zero"),
        ));
    }
    if number > u32::MAX as i64 {
        return Err(coercion_err());
    }
    Ok(number as u32)
}

fn require_date_or_none(value: Option<&Value>, row: usize) -> Result<Option<NaiveDate>> {
    let err = || ValidationError::row(row, "due_date must be null or a YYYY-MM-DD string");
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => parse_due_date(s).map(Some).map_err(|_| err()),
        Some(_) => Err(err()),
    }
}

/// Resolve the discriminator from the canonical field, falling back to the
/// legacy one when the canonical value is absent or not a string.
fn resolve_item_type(
    primary: Option<&Value>,
    fallback: Option<&Value>,
    row: usize,
) -> Result<ItemType> {
    let err = || ValidationError::row(row, "type must be one of Book, DVD");
    let candidate = [primary, fallback]
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .ok_or_else(err)?;
    ItemType::parse(candidate.trim()).ok_or_else(err)
}

fn require_rating(value: Option<&Value>, row: usize) -> Result<u8> {
    let rating = require_positive_int(value, "rating", row)?;
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::row(row, "rating must be between 1 and 5"));
    }
    Ok(rating as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book_row() -> Value {
        json!({
            "id": 1,
            "title": "1984",
            "is_checked_out": false,
            "due_date": null,
            "item_type": "Book",
            "type": "Book",
            "author": "George Orwell",
            "pages": 328
        })
    }

    fn dvd_row() -> Value {
        json!({
            "id": 2,
            "title": "Inception",
            "is_checked_out": true,
            "due_date": "2025-01-15",
            "item_type": "DVD",
            "type": "DVD",
            "duration": 148,
            "duration_minutes": 148,
            "rating": 4
        })
    }

    #[test]
    fn valid_rows_normalize() {
        let record = normalize_row(&book_row(), 0).unwrap();
        assert_eq!(record.id, Some(1));
        assert_eq!(record.title, "1984");
        assert_eq!(record.author.as_deref(), Some("George Orwell"));

        let record = normalize_row(&dvd_row(), 1).unwrap();
        assert_eq!(record.duration, Some(148));
        assert_eq!(record.rating, Some(4));
        assert!(record.is_checked_out);
    }

    #[test]
    fn non_object_rows_are_rejected_with_one_based_numbering() {
        let err = normalize_row(&json!("not an object"), 0).unwrap_err();
        assert_eq!(err.to_string(), "Row 1: each entry must be an object");

        let err = normalize_row(&json!(42), 4).unwrap_err();
        assert_eq!(err.to_string(), "Row 5: each entry must be an object");
    }

    #[test]
    fn id_coercion() {
        let mut row = book_row();
        row["id"] = json!("7");
        assert_eq!(normalize_row(&row, 0).unwrap().id, Some(7));

        for bad in [json!(0), json!(-3), json!("abc"), json!(null), json!(true)] {
            let mut row = book_row();
            row["id"] = bad.clone();
            let err = normalize_row(&row, 0).unwrap_err();
            assert!(err.to_string().contains("id"), "input: {bad}");
        }
    }

    #[test]
    fn title_must_be_a_non_empty_string() {
        let mut row = book_row();
        row["title"] = json!("   ");
        let err = normalize_row(&row, 0).unwrap_err();
        assert_eq!(err.to_string(), "Row 1: title cannot be empty");

        row["title"] = json!(12);
        let err = normalize_row(&row, 0).unwrap_err();
        assert_eq!(err.to_string(), "Row 1: title must be a string");
    }

    #[test]
    fn is_checked_out_requires_literal_booleans() {
        let mut row = book_row();
        row["is_checked_out"] = json!("yes");
        let err = normalize_row(&row, 0).unwrap_err();
        assert_eq!(err.to_string(), "Row 1: is_checked_out must be true or false");

        row["is_checked_out"] = json!(1);
        assert!(normalize_row(&row, 0).is_err());
    }

    #[test]
    fn due_date_rules() {
        let mut row = dvd_row();
        row["due_date"] = json!(null);
        assert_eq!(normalize_row(&row, 0).unwrap().due_date, None);

        row["due_date"] = json!("");
        assert_eq!(normalize_row(&row, 0).unwrap().due_date, None);

        for bad in [json!("01/15/2025"), json!("2025-13-01"), json!(20250115)] {
            let mut row = dvd_row();
            row["due_date"] = bad;
            let err = normalize_row(&row, 0).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Row 1: due_date must be null or a YYYY-MM-DD string"
            );
        }
    }

    #[test]
    fn discriminator_is_case_sensitive_and_falls_back_to_legacy_name() {
        let mut row = book_row();
        row.as_object_mut().unwrap().remove("item_type");
        assert!(normalize_row(&row, 0).is_ok());

        let mut row = book_row();
        row["item_type"] = json!(null);
        assert!(normalize_row(&row, 0).is_ok());

        for bad in ["book", "dvd", "CD"] {
            let mut row = book_row();
            row["item_type"] = json!(bad);
            row["type"] = json!(bad);
            let err = normalize_row(&row, 0).unwrap_err();
            assert_eq!(err.to_string(), "Row 1: type must be one of Book, DVD");
        }
    }

    #[test]
    fn book_fields_are_validated() {
        let mut row = book_row();
        row["author"] = json!("");
        let err = normalize_row(&row, 0).unwrap_err();
        assert_eq!(err.to_string(), "Row 1: author cannot be empty");

        let mut row = book_row();
        row["pages"] = json!(0);
        let err = normalize_row(&row, 0).unwrap_err();
        assert_eq!(err.to_string(), "Row 1: pages must be greater than zero");
    }

    #[test]
    fn duration_falls_back_to_legacy_alias_and_both_are_emitted() {
        let mut row = dvd_row();
        row.as_object_mut().unwrap().remove("duration");
        row["duration_minutes"] = json!(117);
        let record = normalize_row(&row, 0).unwrap();
        assert_eq!(record.duration, Some(117));
        assert_eq!(record.duration_minutes, Some(117));
    }

    #[test]
    fn rating_must_be_an_integer_between_one_and_five() {
        // Integer strings coerce, like every other integer field
        let mut row = dvd_row();
        row["rating"] = json!("4");
        assert_eq!(normalize_row(&row, 0).unwrap().rating, Some(4));

        for bad in [json!(0), json!(6)] {
            let mut row = dvd_row();
            row["rating"] = bad;
            let err = normalize_row(&row, 0).unwrap_err();
            assert!(err.to_string().contains("rating"));
        }

        // Free-text ratings from the legacy schema are rejected
        let mut row = dvd_row();
        row["rating"] = json!("PG-13");
        let err = normalize_row(&row, 0).unwrap_err();
        assert_eq!(err.to_string(), "Row 1: rating must be a positive integer");
    }

    #[test]
    fn document_shapes() {
        assert!(normalize_rows(&json!(null)).unwrap().is_empty());
        assert!(normalize_rows(&json!("")).unwrap().is_empty());
        assert_eq!(normalize_rows(&json!([book_row()])).unwrap().len(), 1);

        let err = normalize_rows(&json!({"items": []})).unwrap_err();
        assert_eq!(err.to_string(), "Items JSON must contain a list of records");
    }

    #[test]
    fn errors_carry_the_position_of_the_bad_row() {
        let mut second = book_row();
        second["is_checked_out"] = json!("yes");
        let err = normalize_rows(&json!([book_row(), second])).unwrap_err();
        assert!(err.to_string().starts_with("Row 2:"));
        assert!(err.to_string().contains("is_checked_out"));
    }
}
