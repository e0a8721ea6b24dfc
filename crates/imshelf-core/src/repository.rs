//! In-memory collection, id assignment, and whole-file JSON persistence.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CorruptStoreError, Result, ShelfError, ValidationError};
use crate::item::{Item, ItemId};
use crate::normalize::normalize_rows;

/// Yes/no prompt used by the corruption-recovery protocol. Blocks until the
/// user answers.
pub type ConfirmFn = Box<dyn Fn(&str) -> bool>;

/// Owns the item collection and mirrors it to a JSON file.
///
/// The in-memory collection is the single source of truth; every persisting
/// mutation rewrites the whole file. Single writer, no locking.
pub struct ShelfRepository {
    path: PathBuf,
    items: Vec<Item>,
    next_id: ItemId,
    confirm_reset: ConfirmFn,
}

impl std::fmt::Debug for ShelfRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShelfRepository")
            .field("path", &self.path)
            .field("items", &self.items)
            .field("next_id", &self.next_id)
            .field("confirm_reset", &"<closure>")
            .finish()
    }
}

impl ShelfRepository {
    /// Open the repository at `path`, loading (or establishing) the backing
    /// file.
    ///
    /// `confirm_reset` is consulted when the file is present but corrupt;
    /// answering no propagates the corruption error to the caller.
    pub fn open(
        path: impl Into<PathBuf>,
        confirm_reset: impl Fn(&str) -> bool + 'static,
    ) -> Result<Self> {
        let mut repo = Self {
            path: path.into(),
            items: Vec::new(),
            next_id: 1,
            confirm_reset: Box::new(confirm_reset),
        };
        repo.load()?;
        Ok(repo)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// (Re)load the collection from the backing file.
    ///
    /// A missing file initializes an empty collection and writes it out. A
    /// present but unusable file triggers the corruption-recovery protocol.
    pub fn load(&mut self) -> Result<()> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "items file absent, creating empty store");
            self.items = Vec::new();
            self.next_id = 1;
            return self.save();
        }

        let raw = fs::read_to_string(&self.path)?;
        match Self::parse_items(&raw) {
            Ok(items) => {
                self.items = items;
                self.sync_next_id();
                debug!(count = self.items.len(), "loaded items");
                Ok(())
            }
            Err(corrupt) => self.recover(corrupt),
        }
    }

    /// Parse and validate a whole document into items.
    fn parse_items(raw: &str) -> std::result::Result<Vec<Item>, CorruptStoreError> {
        let document: Value = serde_json::from_str(raw)?;
        let records = normalize_rows(&document)?;
        let items = records
            .iter()
            .map(Item::from_record)
            .collect::<std::result::Result<Vec<_>, ValidationError>>()?;
        Ok(items)
    }

    /// Corruption-recovery protocol: confirm, then reset or propagate.
    fn recover(&mut self, corrupt: CorruptStoreError) -> Result<()> {
        warn!(error = %corrupt, "items file failed to load");
        let message = format!(
            "The items file contains invalid data.\nDetails: {corrupt}\n\n\
             Would you like to reset it to an empty collection?"
        );
        if (self.confirm_reset)(&message) {
            warn!("resetting items file to an empty collection");
            self.items = Vec::new();
            self.next_id = 1;
            self.save()
        } else {
            Err(ShelfError::CorruptStore(corrupt))
        }
    }

    /// Write the whole collection to the backing file, pretty-printed.
    pub fn save(&self) -> Result<()> {
        let records: Vec<_> = self.items.iter().map(Item::to_record).collect();
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&self.path, json)?;
        debug!(count = self.items.len(), path = %self.path.display(), "saved items");
        Ok(())
    }

    /// Append `item`, assigning a fresh id if it has none, and persist.
    /// Returns the item's id.
    pub fn add_item(&mut self, mut item: Item) -> Result<ItemId> {
        let id = match item.id {
            Some(id) => id,
            None => {
                let id = self.next_id;
                item.id = Some(id);
                id
            }
        };
        // An explicit id may outrun the counter; never hand it out again.
        self.next_id = self.next_id.max(id + 1);
        self.items.push(item);
        self.save()?;
        Ok(id)
    }

    /// Remove the item with `id` (no-op when absent) and persist.
    pub fn delete_item(&mut self, id: ItemId) -> Result<()> {
        self.items.retain(|item| item.id != Some(id));
        self.save()
    }

    /// Defensive copy of the collection, in insertion order.
    pub fn get_all(&self) -> Vec<Item> {
        self.items.clone()
    }

    /// Linear lookup by id.
    pub fn get_by_id(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == Some(id))
    }

    /// Mutable lookup backing the edit/checkout/return flows; callers
    /// `save()` after a successful mutation.
    pub fn get_by_id_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == Some(id))
    }

    /// Case-insensitive exact title match, first hit.
    pub fn find_by_title(&self, title: &str) -> Option<&Item> {
        let needle = title.to_lowercase();
        self.items
            .iter()
            .find(|item| item.title.to_lowercase() == needle)
    }

    /// Recompute the auto-increment counter from the collection.
    fn sync_next_id(&mut self) {
        self.next_id = self
            .items
            .iter()
            .filter_map(|item| item.id)
            .max()
            .unwrap_or(0)
            + 1;
    }
}
