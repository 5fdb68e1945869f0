//! Wire encodings for the DAB acknowledgment gateway.
//!
//! Covers the AIS six-bit/BBM broadcast framing, the length-prefixed
//! JSON socket framing shared by the Ethernet strategy and the onboard
//! interface, and the confirmation payload shapes per transport.

pub mod ais;
pub mod error;
pub mod frame;
pub mod payload;
pub mod reply;
