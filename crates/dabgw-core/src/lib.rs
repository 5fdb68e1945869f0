//! Core primitives for the DAB acknowledgment gateway.
//!
//! Fixed identifier types, the per-message confirmation status machine,
//! and base errors shared across crates.

pub mod error;
pub mod types;

pub use types::{
    Category, DabId, MessageType, Reach, Status, MESSAGE_TYPE_WITH_SIGNAL, TECHNOLOGY_WIFI,
};
