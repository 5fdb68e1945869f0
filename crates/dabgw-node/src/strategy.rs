use tracing::warn;

use dabgw_codec::ais;
use dabgw_codec::error::CodecError;
use dabgw_codec::frame::{decode_frame_header, encode_frame, FRAME_HEADER_LEN};
use dabgw_codec::payload::Confirmation;
use dabgw_codec::reply::{
    decode_capability_reply, decode_ethernet_ack, CapabilityQuery, EthernetAck,
};
use dabgw_transport::{BusLink, LinkError, SocketConn, SocketFactory};

/// Default reply length read back from bus companions.
pub const BUS_REPLY_LEN: usize = 1;

/// Capability probe asking a bus companion whether it has uplink reach.
const BUS_REACH_PROBE: [u8; 1] = [1];

/// Normalized result of one acknowledgment exchange.
///
/// Transport-level faults are always folded into `Failure`; they are
/// expected operational events, not program errors.
#[derive(Debug)]
pub enum AckOutcome {
    /// Sent over a transport with no reply channel (fire-and-forget).
    NoReply,
    /// Transport fault or empty reply; the attempt failed.
    Failure,
    /// A reply came back and still needs interpretation.
    Reply(ReplyRecord),
}

#[derive(Debug)]
pub enum ReplyRecord {
    /// Raw bytes read back from a bus companion.
    Bus(Vec<u8>),
    /// Structured record from an Ethernet exchange.
    Ethernet(EthernetAck),
}

/// Tag identifying the transport kind of a bound strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Ais,
    I2c,
    Spi,
    Ethernet,
}

/// Transport-specific encode/send/interpret behavior bound to a device.
///
/// A closed set: selection and payload-shaping logic switches on
/// [`StrategyKind`] rather than inspecting types.
pub enum Strategy {
    Ais(AisStrategy),
    I2c(BusStrategy),
    Spi(BusStrategy),
    Ethernet(EthernetStrategy),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Ais(_) => StrategyKind::Ais,
            Strategy::I2c(_) => StrategyKind::I2c,
            Strategy::Spi(_) => StrategyKind::Spi,
            Strategy::Ethernet(_) => StrategyKind::Ethernet,
        }
    }

    /// Sends one confirmation and normalizes the outcome.
    ///
    /// I2C writes the stripped 5-byte id/type frame; the other
    /// strategies carry the full payload.
    pub fn communicate(&mut self, confirmation: &Confirmation) -> AckOutcome {
        match self {
            Strategy::Ais(strategy) => strategy.communicate(confirmation),
            Strategy::I2c(strategy) => strategy.communicate(&confirmation.bus_frame()),
            Strategy::Spi(strategy) => match confirmation.to_json_bytes() {
                Ok(body) => strategy.communicate(&body),
                Err(err) => {
                    warn!("spi payload encode failed: {err}");
                    AckOutcome::Failure
                }
            },
            Strategy::Ethernet(strategy) => strategy.communicate(confirmation),
        }
    }
}

/// Fire-and-forget AIS broadcast: BBM-framed six-bit acknowledgment.
pub struct AisStrategy {
    link: Box<dyn BusLink>,
}

impl AisStrategy {
    pub fn new(link: Box<dyn BusLink>) -> Self {
        Self { link }
    }

    fn communicate(&mut self, confirmation: &Confirmation) -> AckOutcome {
        let frame = ais::encode_bbm_ack(
            confirmation.dab_id,
            confirmation.message_type,
            confirmation.dab_signal,
        );
        match self.link.write(&frame) {
            Ok(()) => AckOutcome::NoReply,
            Err(err) => {
                warn!("ais broadcast failed: {err}");
                AckOutcome::Failure
            }
        }
    }
}

/// Half-duplex bus exchange (I2C/SPI): write, then read a fixed-length
/// reply; an all-zero or empty reply is a failure.
pub struct BusStrategy {
    link: Box<dyn BusLink>,
    reply_len: usize,
}

impl BusStrategy {
    pub fn new(link: Box<dyn BusLink>) -> Self {
        Self::with_reply_len(link, BUS_REPLY_LEN)
    }

    pub fn with_reply_len(link: Box<dyn BusLink>, reply_len: usize) -> Self {
        Self { link, reply_len }
    }

    fn communicate(&mut self, frame: &[u8]) -> AckOutcome {
        let exchange = self
            .link
            .write(frame)
            .and_then(|()| self.link.read(self.reply_len));
        match exchange {
            Ok(reply) if reply.iter().any(|byte| *byte != 0) => {
                AckOutcome::Reply(ReplyRecord::Bus(reply))
            }
            Ok(_) => AckOutcome::Failure,
            Err(err) => {
                warn!("bus exchange failed: {err}");
                AckOutcome::Failure
            }
        }
    }

    /// One-byte capability probe; a truthy reply means uplink reach.
    pub fn query_reach(&mut self) -> bool {
        let exchange = self
            .link
            .write(&BUS_REACH_PROBE)
            .and_then(|()| self.link.read(1));
        match exchange {
            Ok(reply) => reply.iter().any(|byte| *byte != 0),
            Err(err) => {
                warn!("bus reach probe failed: {err}");
                false
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ExchangeFault {
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Length-prefixed JSON exchange over a scoped per-attempt socket.
pub struct EthernetStrategy {
    factory: Box<dyn SocketFactory>,
}

impl EthernetStrategy {
    pub fn new(factory: Box<dyn SocketFactory>) -> Self {
        Self { factory }
    }

    /// One request/reply round trip. The connection is dropped on every
    /// exit path, releasing the socket.
    fn exchange(&mut self, body: &[u8]) -> Result<Vec<u8>, ExchangeFault> {
        let mut conn = self.factory.connect()?;
        conn.write_all(&encode_frame(body)?)?;
        let header = conn.read_exact(FRAME_HEADER_LEN)?;
        let reply_len = decode_frame_header(&header)?;
        Ok(conn.read_exact(reply_len)?)
    }

    fn communicate(&mut self, confirmation: &Confirmation) -> AckOutcome {
        let body = match confirmation.to_json_bytes() {
            Ok(body) => body,
            Err(err) => {
                warn!("confirmation encode failed: {err}");
                return AckOutcome::Failure;
            }
        };
        match self.exchange(&body) {
            Ok(reply) => match decode_ethernet_ack(&reply) {
                Ok(ack) => AckOutcome::Reply(ReplyRecord::Ethernet(ack)),
                Err(err) => {
                    warn!("ethernet ack decode failed: {err}");
                    AckOutcome::Failure
                }
            },
            Err(err) => {
                warn!("ethernet exchange failed: {err}");
                AckOutcome::Failure
            }
        }
    }

    /// Synchronous capability query: does `technology` currently have
    /// reach? Errors and falsy replies both mean no.
    pub fn query_reach(&mut self, technology: &str) -> bool {
        let query = CapabilityQuery {
            has_reach: technology,
        };
        let body = match serde_json::to_vec(&query) {
            Ok(body) => body,
            Err(err) => {
                warn!("capability query encode failed: {err}");
                return false;
            }
        };
        match self.exchange(&body) {
            Ok(reply) => decode_capability_reply(&reply)
                .map(|parsed| parsed.reply)
                .unwrap_or(false),
            Err(err) => {
                warn!("capability query failed: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AckOutcome, AisStrategy, BusStrategy, EthernetStrategy, ReplyRecord, Strategy};
    use dabgw_codec::frame::{encode_frame, FRAME_HEADER_LEN};
    use dabgw_codec::payload::Confirmation;
    use dabgw_transport::mem::{InMemorySocket, SharedBusLink};

    fn confirmation() -> Confirmation {
        Confirmation {
            dab_id: 42,
            message_type: 1,
            dab_msg_arrived_at: 1_700_000_000,
            sender: 3,
            dab_signal: None,
            technology: Some("Wifi".to_string()),
        }
    }

    #[test]
    fn ais_is_fire_and_forget() {
        let link = SharedBusLink::default();
        let mut strategy = Strategy::Ais(AisStrategy::new(Box::new(link.clone())));

        assert!(matches!(
            strategy.communicate(&confirmation()),
            AckOutcome::NoReply
        ));
        let written = link.take_written();
        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with(b"!AIBBM,1,1,0,1,8,"));
    }

    #[test]
    fn ais_write_fault_becomes_failure() {
        let link = SharedBusLink::default();
        link.set_fail_writes(true);
        let mut strategy = Strategy::Ais(AisStrategy::new(Box::new(link)));
        assert!(matches!(
            strategy.communicate(&confirmation()),
            AckOutcome::Failure
        ));
    }

    #[test]
    fn i2c_sends_stripped_frame_and_reads_reply() {
        let link = SharedBusLink::default();
        link.enqueue_reply(vec![1]);
        let mut strategy = Strategy::I2c(BusStrategy::new(Box::new(link.clone())));

        let outcome = strategy.communicate(&confirmation());
        assert!(matches!(
            outcome,
            AckOutcome::Reply(ReplyRecord::Bus(reply)) if reply == vec![1]
        ));
        // Extended payload fields must not reach the bus.
        assert_eq!(link.take_written(), vec![vec![42, 0, 0, 0, 1]]);
    }

    #[test]
    fn empty_or_zero_bus_reply_is_failure() {
        let link = SharedBusLink::default();
        let mut strategy = Strategy::I2c(BusStrategy::new(Box::new(link.clone())));
        assert!(matches!(
            strategy.communicate(&confirmation()),
            AckOutcome::Failure
        ));

        link.enqueue_reply(vec![0]);
        assert!(matches!(
            strategy.communicate(&confirmation()),
            AckOutcome::Failure
        ));
    }

    #[test]
    fn spi_carries_full_json_payload() {
        let link = SharedBusLink::default();
        link.enqueue_reply(vec![1]);
        let mut strategy = Strategy::Spi(BusStrategy::new(Box::new(link.clone())));

        strategy.communicate(&confirmation());
        let written = link.take_written();
        let body: Confirmation =
            serde_json::from_slice(&written[0]).expect("spi payload should be json");
        assert_eq!(body, confirmation());
    }

    #[test]
    fn bus_reach_probe_interprets_reply_bytes() {
        let link = SharedBusLink::default();
        let mut strategy = BusStrategy::new(Box::new(link.clone()));

        link.enqueue_reply(vec![1]);
        assert!(strategy.query_reach());
        link.enqueue_reply(vec![0]);
        assert!(!strategy.query_reach());
        // No reply queued: empty read means no reach.
        assert!(!strategy.query_reach());
        assert_eq!(link.take_written(), vec![vec![1], vec![1], vec![1]]);
    }

    #[test]
    fn ethernet_round_trip_parses_ack_and_releases_socket() {
        let socket = InMemorySocket::default();
        let reply = encode_frame(br#"{"reply": true, "ack_information": [42, true]}"#)
            .expect("reply should frame");
        socket.script_reply(&reply);

        let mut strategy = Strategy::Ethernet(EthernetStrategy::new(Box::new(socket.clone())));
        let outcome = strategy.communicate(&confirmation());
        let AckOutcome::Reply(ReplyRecord::Ethernet(ack)) = outcome else {
            panic!("expected an ethernet reply record");
        };
        assert_eq!(ack.ack_information, (42, true));
        assert_eq!(socket.open_connections(), 0);

        let written = socket.take_written();
        let body: Confirmation = serde_json::from_slice(&written[FRAME_HEADER_LEN..])
            .expect("request body should be json");
        assert_eq!(body.dab_id, 42);
    }

    #[test]
    fn ethernet_faults_become_failure() {
        let socket = InMemorySocket::default();
        socket.set_fail_connect(true);
        let mut strategy = Strategy::Ethernet(EthernetStrategy::new(Box::new(socket.clone())));
        assert!(matches!(
            strategy.communicate(&confirmation()),
            AckOutcome::Failure
        ));

        // Truncated reply stream.
        socket.set_fail_connect(false);
        socket.script_reply(b"0000000099");
        assert!(matches!(
            strategy.communicate(&confirmation()),
            AckOutcome::Failure
        ));
        assert_eq!(socket.open_connections(), 0);
    }

    #[test]
    fn ethernet_reach_query_carries_technology() {
        let socket = InMemorySocket::default();
        socket.script_reply(&encode_frame(br#"{"reply": true}"#).expect("reply should frame"));
        let mut strategy = EthernetStrategy::new(Box::new(socket.clone()));

        assert!(strategy.query_reach("4G"));
        let written = socket.take_written();
        assert_eq!(&written[FRAME_HEADER_LEN..], br#"{"has_reach":"4G"}"#);

        socket.script_reply(&encode_frame(br#"{"reply": false}"#).expect("reply should frame"));
        assert!(!strategy.query_reach("4G"));
    }
}
