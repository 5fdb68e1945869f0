use serde::{Deserialize, Serialize};

use dabgw_core::DabId;

use crate::error::CodecError;

/// Structured acknowledgment record returned by an Ethernet exchange.
///
/// `ack_information` names the message the remote end is confirming and
/// its validity verdict. `different_ack_information` is an optional
/// batch of other messages confirmed in the same round trip (WiFi only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthernetAck {
    pub reply: bool,
    pub ack_information: (DabId, bool),
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub different_ack_information: Vec<(DabId, bool)>,
}

/// Decodes the JSON body of an Ethernet acknowledgment reply.
pub fn decode_ethernet_ack(bytes: &[u8]) -> Result<EthernetAck, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Capability query asking whether `technology` currently has reach.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityQuery<'a> {
    pub has_reach: &'a str,
}

/// Reply to a capability query.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CapabilityReply {
    pub reply: bool,
}

/// Decodes the JSON body of a capability reply.
pub fn decode_capability_reply(bytes: &[u8]) -> Result<CapabilityReply, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}
