use dabgw_core::{DabId, MessageType};

/// Builds the human-readable acknowledgment text broadcast over AIS.
///
/// `dab_signal` is present only for message types that report signal
/// quality; the SNR field is fixed at -1 because the receiver cannot
/// measure it.
pub fn ack_text(dab_id: DabId, message_type: MessageType, dab_signal: Option<i32>) -> String {
    match dab_signal {
        Some(signal) => format!("  ACK:{dab_id},MSG:{message_type},RSSI:{signal},SNR:-1"),
        None => format!("  ACK:{dab_id},MSG:{message_type}"),
    }
}

/// Packs 8-bit ASCII text into the six-bit armored payload alphabet used
/// by AIS encapsulated sentences.
///
/// Returns the armored payload string and the number of fill bits
/// appended to reach a six-bit boundary.
pub fn sixbit_armor(text: &str) -> (String, u8) {
    let mut bits = Vec::with_capacity(text.len() * 8);
    for byte in text.bytes() {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    let fill = (6 - bits.len() % 6) % 6;
    bits.resize(bits.len() + fill, 0);

    let mut payload = String::with_capacity(bits.len() / 6);
    for group in bits.chunks(6) {
        let value = group.iter().fold(0_u8, |acc, bit| (acc << 1) | bit);
        let armored = if value < 40 { value + 48 } else { value + 56 };
        payload.push(armored as char);
    }
    (payload, fill as u8)
}

/// XOR checksum over an NMEA sentence body (the text between `!` and `*`).
pub fn nmea_checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, byte| acc ^ byte)
}

/// Encapsulates an armored payload in a `!AIBBM` binary-broadcast
/// sentence.
pub fn bbm_sentence(
    total: u8,
    number: u8,
    sequence: u8,
    channel: u8,
    message_id: u8,
    payload: &str,
    fill_bits: u8,
) -> String {
    let body =
        format!("AIBBM,{total},{number},{sequence},{channel},{message_id},{payload},{fill_bits}");
    let checksum = nmea_checksum(&body);
    format!("!{body}*{checksum:02X}")
}

/// Builds the complete BBM frame bytes for one acknowledgment.
pub fn encode_bbm_ack(dab_id: DabId, message_type: MessageType, dab_signal: Option<i32>) -> Vec<u8> {
    let text = ack_text(dab_id, message_type, dab_signal);
    let (payload, fill) = sixbit_armor(&text);
    bbm_sentence(1, 1, 0, 1, 8, &payload, fill).into_bytes()
}
