//! `ordhash`: an insertion-ordered, open-addressed hash table.
//!
//! The live `(key, value)` records are held in a dense, append-only
//! Entry Vector; a separate power-of-two-sized Hash Index maps hash
//! slots to positions in that vector. Positions are stable across
//! inserts and deletes (deletes leave a tombstone rather than
//! compacting), so a key that is deleted and re-inserted lands at the
//! tail of the insertion order, not its original rank.
//!
//! The core type is [`Dict`]. See its docs for the full operation
//! surface; [`hash::DictKey`] is the capability a key type must
//! implement.

pub mod dict;
mod entry;
pub mod error;
pub mod hash;
mod index;
pub mod views;

pub use dict::{Dict, DictConfig, InsertOutcome};
pub use error::{DictError, Result};
pub use hash::DictKey;
pub use views::{ItemsView, KeysView, ValuesView};
