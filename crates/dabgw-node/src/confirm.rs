use std::sync::Arc;

use tracing::{debug, error};

use dabgw_codec::payload::Confirmation;
use dabgw_codec::reply::EthernetAck;
use dabgw_core::{Status, MESSAGE_TYPE_WITH_SIGNAL, TECHNOLOGY_WIFI};

use crate::device::Device;
use crate::registry::DeviceSource;
use crate::select::select;
use crate::signal::SignalSource;
use crate::store::{Message, MessageUpdate, RetrySeed, SharedStore};
use crate::strategy::{AckOutcome, ReplyRecord, StrategyKind};

/// Central coordinator: turns one message into zero or more device
/// attempts and a resulting status update.
pub struct Orchestrator {
    store: SharedStore,
    devices: Arc<dyn DeviceSource>,
    signal: Arc<dyn SignalSource>,
    sender: u32,
    wifi_label: String,
}

impl Orchestrator {
    pub fn new(
        store: SharedStore,
        devices: Arc<dyn DeviceSource>,
        signal: Arc<dyn SignalSource>,
        sender: u32,
    ) -> Self {
        Self {
            store,
            devices,
            signal,
            sender,
            wifi_label: TECHNOLOGY_WIFI.to_string(),
        }
    }

    /// Overrides the technology label treated as the authoritative WiFi
    /// backhaul.
    pub fn with_wifi_label(mut self, label: impl Into<String>) -> Self {
        self.wifi_label = label.into();
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Handles one new-message signal.
    ///
    /// A signal for an id already held CONFIRMED is discarded entirely;
    /// otherwise the message is stored (if new) and attempted at once.
    pub fn handle_new_message(&self, message: Message) {
        let seed = RetrySeed::of(&message);
        if !self.store.admit_new(message) {
            debug!("discarding signal for confirmed dab message {}", seed.id);
            return;
        }
        self.attempt(seed);
    }

    /// Runs one acknowledgment attempt for the seeded message.
    ///
    /// Devices are tried strictly in selection order; the first failure
    /// aborts the remainder and marks the message SKIP.
    pub fn attempt(&self, seed: RetrySeed) {
        let mut confirmation = self.build_confirmation(&seed);

        let devices = match self.devices.load() {
            Ok(devices) => devices,
            Err(err) => {
                error!("device registry unavailable: {err}");
                Vec::new()
            }
        };
        let selected = select(devices);
        if selected.is_empty() {
            self.store.update(seed.id, MessageUpdate::status(Status::Skip));
            return;
        }

        for mut device in selected {
            // I2C accepts only the stripped id/type frame; every other
            // transport carries the device's technology label.
            confirmation.technology = if device.strategy_kind() == StrategyKind::I2c {
                None
            } else {
                Some(device.technology.clone())
            };

            match device.acknowledge(&confirmation) {
                AckOutcome::Failure => {
                    self.store.update(seed.id, MessageUpdate::status(Status::Skip));
                    return;
                }
                AckOutcome::NoReply => {
                    self.store
                        .update(seed.id, MessageUpdate::status(Status::ConfirmationSent));
                }
                AckOutcome::Reply(ReplyRecord::Ethernet(ack)) => {
                    self.apply_ethernet_ack(&seed, &device, &ack);
                }
                AckOutcome::Reply(ReplyRecord::Bus(reply)) => {
                    let status = if reply.iter().any(|byte| *byte != 0) {
                        Status::ConfirmationSent
                    } else {
                        Status::Skip
                    };
                    self.store.update(seed.id, MessageUpdate::status(status));
                }
            }
        }
    }

    fn build_confirmation(&self, seed: &RetrySeed) -> Confirmation {
        Confirmation {
            dab_id: seed.id,
            message_type: seed.message_type,
            dab_msg_arrived_at: seed.arrived_at,
            sender: self.sender,
            dab_signal: (seed.message_type == MESSAGE_TYPE_WITH_SIGNAL)
                .then(|| self.signal.dab_signal()),
            technology: None,
        }
    }

    /// Interprets an Ethernet reply record.
    ///
    /// A WiFi round trip is an authoritative batch acknowledgment: the
    /// primary id confirms on match, and every entry of the batch list
    /// confirms with its carried validity.
    fn apply_ethernet_ack(&self, seed: &RetrySeed, device: &Device, ack: &EthernetAck) {
        let matches = seed.id == ack.ack_information.0;
        let new_status = if device.technology == self.wifi_label {
            for (other_id, other_valid) in &ack.different_ack_information {
                self.store.update(
                    *other_id,
                    MessageUpdate::status_and_valid(Status::Confirmed, *other_valid),
                );
            }
            if matches {
                Status::Confirmed
            } else {
                Status::Skip
            }
        } else if matches {
            Status::ConfirmationSent
        } else {
            Status::Skip
        };
        self.store.update(
            seed.id,
            MessageUpdate::status_and_valid(new_status, ack.ack_information.1),
        );
    }
}
