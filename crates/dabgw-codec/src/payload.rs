use serde::{Deserialize, Serialize};

use dabgw_core::{DabId, MessageType};

use crate::error::CodecError;

/// Byte length of the stripped id/type frame written to bus devices.
pub const BUS_FRAME_LEN: usize = 5;

/// Confirmation payload built by the orchestrator for one acknowledgment
/// attempt.
///
/// `dab_signal` is set only for signal-reporting message types;
/// `technology` is filled in per device just before sending (and dropped
/// entirely for I2C, see [`Confirmation::bus_frame`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub dab_id: DabId,
    pub message_type: MessageType,
    pub dab_msg_arrived_at: u64,
    pub sender: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dab_signal: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
}

impl Confirmation {
    /// Serializes the payload for a socket exchange.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Strips the confirmation down to exactly the id/type pair the bus
    /// companions accept: `dab_id` little-endian followed by the type.
    pub fn bus_frame(&self) -> [u8; BUS_FRAME_LEN] {
        let mut frame = [0_u8; BUS_FRAME_LEN];
        frame[..4].copy_from_slice(&self.dab_id.to_le_bytes());
        frame[4] = self.message_type;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::Confirmation;

    fn sample() -> Confirmation {
        Confirmation {
            dab_id: 0x0102_0304,
            message_type: 4,
            dab_msg_arrived_at: 1_700_000_000,
            sender: 9,
            dab_signal: Some(20),
            technology: Some("Wifi".to_string()),
        }
    }

    #[test]
    fn bus_frame_carries_only_id_and_type() {
        // Extended fields are present on the payload but must not leak
        // into the bus frame.
        assert_eq!(sample().bus_frame(), [0x04, 0x03, 0x02, 0x01, 4]);
    }

    #[test]
    fn json_omits_absent_optional_fields() {
        let payload = Confirmation {
            dab_signal: None,
            technology: None,
            ..sample()
        };
        let json = String::from_utf8(payload.to_json_bytes().expect("payload should encode"))
            .expect("json should be utf-8");
        assert!(!json.contains("dab_signal"));
        assert!(!json.contains("technology"));
        assert!(json.contains("\"dab_id\":16909060"));
    }

    #[test]
    fn json_round_trip_keeps_optional_fields() {
        let payload = sample();
        let bytes = payload.to_json_bytes().expect("payload should encode");
        let parsed: Confirmation =
            serde_json::from_slice(&bytes).expect("payload should decode");
        assert_eq!(parsed, payload);
    }
}
