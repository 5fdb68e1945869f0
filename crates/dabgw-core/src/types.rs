use serde::{Deserialize, Serialize};

/// Identifier carried by every inbound DAB message.
pub type DabId = u32;
/// Small integer selecting the DAB payload variant.
pub type MessageType = u8;

/// Message type whose confirmation carries signal-quality fields.
pub const MESSAGE_TYPE_WITH_SIGNAL: MessageType = 4;

/// Technology label that marks an Ethernet device as the authoritative
/// WiFi backhaul.
pub const TECHNOLOGY_WIFI: &str = "Wifi";

/// Confirmation state of one DAB message, ordered from least to most
/// confirmed.
///
/// `Skip` is reset to `Unconfirmed` on the next retry pass; `Confirmed`
/// is terminal. `ConfirmationSent` marks transports that cannot prove
/// end-to-end delivery and is not retried on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Unconfirmed,
    Confirming,
    ConfirmationSent,
    Confirmed,
    Skip,
}

impl Status {
    /// Whether the message never needs another acknowledgment attempt.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Confirmed)
    }
}

/// Classification tag parsed from a message file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Location,
    Weather,
    Other,
}

impl Category {
    /// Parses a category label; unrecognized labels map to `Other`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "location" => Category::Location,
            "weather" => Category::Weather,
            _ => Category::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Location => "location",
            Category::Weather => "weather",
            Category::Other => "other",
        }
    }
}

/// Result of probing whether a device currently has a viable path to a
/// receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    Reachable,
    NoReach,
    Unknown,
}
