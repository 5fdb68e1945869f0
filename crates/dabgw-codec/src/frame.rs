use crate::error::CodecError;

/// Byte length of the fixed first frame carrying the body length.
pub const FRAME_HEADER_LEN: usize = 10;

/// Encodes the fixed-length ASCII header announcing a body of `len`
/// bytes, zero-padded on the left.
pub fn encode_frame_header(len: usize) -> Result<[u8; FRAME_HEADER_LEN], CodecError> {
    let text = len.to_string();
    if text.len() > FRAME_HEADER_LEN {
        return Err(CodecError::Oversize(len));
    }
    let mut header = [b'0'; FRAME_HEADER_LEN];
    header[FRAME_HEADER_LEN - text.len()..].copy_from_slice(text.as_bytes());
    Ok(header)
}

/// Decodes a fixed-length header into the announced body length.
///
/// Tolerates zero- or space-padded headers.
pub fn decode_frame_header(header: &[u8]) -> Result<usize, CodecError> {
    if header.len() != FRAME_HEADER_LEN {
        return Err(CodecError::InvalidFrame("header length mismatch"));
    }
    let text = std::str::from_utf8(header)
        .map_err(|_| CodecError::InvalidFrame("header is not ascii"))?;
    text.trim()
        .parse::<usize>()
        .map_err(|_| CodecError::InvalidFrame("header is not a length"))
}

/// Frames a body: fixed-length header followed by the body bytes.
pub fn encode_frame(body: &[u8]) -> Result<Vec<u8>, CodecError> {
    let header = encode_frame_header(body.len())?;
    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{
        decode_frame_header, encode_frame, encode_frame_header, FRAME_HEADER_LEN,
    };

    #[test]
    fn header_round_trip() {
        let header = encode_frame_header(42).expect("42 should fit the header");
        assert_eq!(&header, b"0000000042");
        assert_eq!(decode_frame_header(&header).expect("header should parse"), 42);
    }

    #[test]
    fn header_tolerates_space_padding() {
        assert_eq!(
            decode_frame_header(b"        42").expect("padded header should parse"),
            42
        );
    }

    #[test]
    fn header_rejects_garbage_and_wrong_length() {
        assert!(decode_frame_header(b"42").is_err());
        assert!(decode_frame_header(b"not-a-len!").is_err());
    }

    #[test]
    fn oversize_body_is_rejected() {
        assert!(encode_frame_header(10_usize.pow(FRAME_HEADER_LEN as u32)).is_err());
    }

    #[test]
    fn encode_frame_prefixes_body() {
        let frame = encode_frame(b"{\"reply\":true}").expect("frame should encode");
        assert_eq!(&frame[..FRAME_HEADER_LEN], b"0000000014");
        assert_eq!(&frame[FRAME_HEADER_LEN..], b"{\"reply\":true}");
    }
}
