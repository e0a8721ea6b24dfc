//! Add/edit form state and input coercion.
//!
//! Form entries are plain text buffers; coercion into typed values happens
//! once, on submit, and a rejected submit keeps the form open with the
//! specific field error in the status line.

use imshelf_core::{Item, ItemId, ItemType, Media, ValidationError};

/// One text field in a form.
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
}

impl FormField {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// State for the add/edit form.
#[derive(Debug, Clone)]
pub struct ItemForm {
    pub item_type: ItemType,
    /// Id of the item being edited; None for an add.
    pub editing: Option<ItemId>,
    pub fields: Vec<FormField>,
    pub focus: usize,
}

impl ItemForm {
    /// Empty form for adding a new item of `item_type`.
    pub fn add(item_type: ItemType) -> Self {
        let fields = match item_type {
            ItemType::Book => vec![
                FormField::new("Title", ""),
                FormField::new("Author", ""),
                FormField::new("Pages", ""),
            ],
            ItemType::Dvd => vec![
                FormField::new("Title", ""),
                FormField::new("Duration (minutes)", ""),
                FormField::new("Rating (1-5)", ""),
            ],
        };
        Self {
            item_type,
            editing: None,
            fields,
            focus: 0,
        }
    }

    /// Form prefilled from an existing item.
    pub fn edit(item: &Item) -> Self {
        let fields = match &item.media {
            Media::Book { author, pages } => vec![
                FormField::new("Title", item.title.clone()),
                FormField::new("Author", author.clone()),
                FormField::new("Pages", pages.to_string()),
            ],
            Media::Dvd {
                duration_minutes,
                rating,
            } => vec![
                FormField::new("Title", item.title.clone()),
                FormField::new("Duration (minutes)", duration_minutes.to_string()),
                FormField::new("Rating (1-5)", rating.to_string()),
            ],
        };
        Self {
            item_type: item.item_type(),
            editing: item.id,
            fields,
            focus: 0,
        }
    }

    /// Title of the form window.
    pub fn title(&self) -> String {
        let action = if self.editing.is_some() { "Edit" } else { "Add" };
        format!("{action} {}", self.item_type)
    }

    pub fn focused_mut(&mut self) -> &mut FormField {
        &mut self.fields[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    /// Coerce the entries into a validated title + media payload.
    pub fn validated_payload(&self) -> Result<(String, Media), ValidationError> {
        match self.item_type {
            ItemType::Book => {
                let title = require_entry(&self.fields[0].value, "Title")?;
                let author = require_entry(&self.fields[1].value, "Author")?;
                let pages = coerce_positive_int(&self.fields[2].value, "Pages")?;
                Ok((title, Media::Book { author, pages }))
            }
            ItemType::Dvd => {
                let title = require_entry(&self.fields[0].value, "Title")?;
                let duration_minutes = coerce_positive_int(&self.fields[1].value, "Duration")?;
                let rating = coerce_rating(&self.fields[2].value)?;
                Ok((
                    title,
                    Media::Dvd {
                        duration_minutes,
                        rating,
                    },
                ))
            }
        }
    }
}

fn require_entry(value: &str, label: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::input(format!("{label} is required")));
    }
    Ok(trimmed.to_string())
}

fn coerce_positive_int(value: &str, label: &str) -> Result<u32, ValidationError> {
    let number: i64 = value
        .trim()
        .parse()
        .map_err(|_| ValidationError::input(format!("{label} must be a positive integer")))?;
    if number <= 0 || number > u32::MAX as i64 {
        return Err(ValidationError::input(format!(
            "{label} must be greater than zero"
        )));
    }
    Ok(number as u32)
}

fn coerce_rating(value: &str) -> Result<u8, ValidationError> {
    let rating = coerce_positive_int(value, "Rating")?;
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::input("Rating must be between 1 and 5"));
    }
    Ok(rating as u8)
}
