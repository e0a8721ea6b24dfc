//! imshelf-core - Library holdings model and JSON-file repository
//!
//! This crate provides the core of the imshelf inventory manager:
//!
//! - **Item**: books and DVDs as a closed tagged union, with checkout/return
//!   state transitions that keep the due-date invariant
//! - **Record**: the flat persisted form of an item, carrying the legacy
//!   field aliases for backward file compatibility
//! - **Normalize**: strict per-row validation of raw loaded JSON, with
//!   1-based row numbers in every message
//! - **Repository**: the in-memory collection, id assignment, and whole-file
//!   JSON persistence with a confirm-then-reset corruption recovery
//! - **Config**: data-file path resolution, TOML-loadable
//!
//! The in-memory collection is the single source of truth; the on-disk file
//! is a mirror, rewritten in full on every persisting mutation.

pub mod config;
pub mod error;
pub mod item;
pub mod normalize;
pub mod record;
pub mod repository;

pub use config::ShelfConfig;
pub use error::{CorruptStoreError, InvalidStateError, Result, ShelfError, ValidationError};
pub use item::{parse_due_date, Item, ItemId, ItemType, Media, DATE_FORMAT};
pub use normalize::{normalize_row, normalize_rows};
pub use record::ItemRecord;
pub use repository::ShelfRepository;
