use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::warn;

use dabgw_core::error::CoreError;
use dabgw_core::{Category, DabId, MessageType, Status};

/// One inbound DAB message awaiting (or holding) confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: DabId,
    pub message_type: MessageType,
    /// Arrival time in unix seconds.
    pub arrived_at: u64,
    pub category: Category,
    /// Raw content lines as read from the message file, served verbatim
    /// to onboard consumers.
    pub lines: Vec<String>,
    pub status: Status,
    /// Whether the content passed validation; ack replies may override.
    pub valid: bool,
    /// Set once the onboard-systems interface served this message.
    pub delivered_to_consumer: bool,
}

impl Message {
    pub fn new(
        id: DabId,
        message_type: MessageType,
        arrived_at: u64,
        category: Category,
        lines: Vec<String>,
    ) -> Self {
        Self {
            id,
            message_type,
            arrived_at,
            category,
            lines,
            status: Status::Unconfirmed,
            valid: true,
            delivered_to_consumer: false,
        }
    }

    /// Parses a message file: line 1 is the id, line 2 the type, line 3
    /// the category, remaining lines are payload.
    pub fn from_lines(lines: Vec<String>, arrived_at: u64) -> Result<Self, CoreError> {
        let id = lines
            .first()
            .and_then(|line| line.trim().parse().ok())
            .ok_or(CoreError::Parse("missing or invalid dab id"))?;
        let message_type = lines
            .get(1)
            .and_then(|line| line.trim().parse().ok())
            .ok_or(CoreError::Parse("missing or invalid message type"))?;
        let category = Category::parse(lines.get(2).map(String::as_str).unwrap_or(""));
        Ok(Self::new(id, message_type, arrived_at, category, lines))
    }
}

/// Fields applied by one store update; `None` leaves a field untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageUpdate {
    pub status: Option<Status>,
    pub valid: Option<bool>,
}

impl MessageUpdate {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            valid: None,
        }
    }

    pub fn status_and_valid(status: Status, valid: bool) -> Self {
        Self {
            status: Some(status),
            valid: Some(valid),
        }
    }
}

/// Seed fields needed to (re-)attempt one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySeed {
    pub id: DabId,
    pub message_type: MessageType,
    pub arrived_at: u64,
}

impl RetrySeed {
    pub fn of(message: &Message) -> Self {
        Self {
            id: message.id,
            message_type: message.message_type,
            arrived_at: message.arrived_at,
        }
    }
}

/// Ordered collection of all known messages, at most one per id.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    /// Linear lookup by id; absence is not an error.
    pub fn find(&self, id: DabId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    fn find_mut(&mut self, id: DabId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|message| message.id == id)
    }

    /// Appends `message` unless one with the same id is already held.
    pub fn insert(&mut self, message: Message) -> bool {
        if self.find(message.id).is_some() {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Applies `update` to the matching message; unknown ids are logged
    /// and ignored.
    pub fn update(&mut self, id: DabId, update: MessageUpdate) {
        let Some(message) = self.find_mut(id) else {
            warn!("update for unknown dab message {id} ignored");
            return;
        };
        if let Some(status) = update.status {
            message.status = status;
        }
        if let Some(valid) = update.valid {
            message.valid = valid;
        }
    }

    /// Full message sequence in insertion order.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// One retry pass over the store: UNCONFIRMED messages move to
    /// CONFIRMING and are returned for re-attempt; SKIP messages reset
    /// to UNCONFIRMED for the following pass.
    pub fn begin_retry_pass(&mut self) -> Vec<RetrySeed> {
        let mut due = Vec::new();
        for message in &mut self.messages {
            match message.status {
                Status::Unconfirmed => {
                    message.status = Status::Confirming;
                    due.push(RetrySeed::of(message));
                }
                Status::Skip => message.status = Status::Unconfirmed,
                _ => {}
            }
        }
        due
    }

    /// Serves the content of undelivered messages matching `valid`,
    /// marking them delivered.
    pub fn take_undelivered(&mut self, valid: bool) -> Vec<Vec<String>> {
        self.take_matching(|message| !message.delivered_to_consumer && message.valid == valid)
    }

    /// Serves the content of messages in `category` matching `valid`,
    /// marking them delivered.
    pub fn take_by_category(&mut self, category: Category, valid: bool) -> Vec<Vec<String>> {
        self.take_matching(|message| message.category == category && message.valid == valid)
    }

    fn take_matching(&mut self, keep: impl Fn(&Message) -> bool) -> Vec<Vec<String>> {
        let mut served = Vec::new();
        for message in &mut self.messages {
            if keep(message) {
                message.delivered_to_consumer = true;
                served.push(message.lines.clone());
            }
        }
        served
    }
}

/// Shared store handle serializing every find+update sequence behind one
/// lock, so concurrent retry passes, new-message signals, and in-flight
/// attempts cannot lose updates.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<MessageStore>>,
}

impl SharedStore {
    fn lock(&self) -> MutexGuard<'_, MessageStore> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Admits a new-message signal. Returns `false` when the id is
    /// already held CONFIRMED (the signal must be discarded); otherwise
    /// stores the message if unseen and clears the way for an attempt.
    pub fn admit_new(&self, message: Message) -> bool {
        let mut store = self.lock();
        match store.find(message.id) {
            Some(existing) if existing.status == Status::Confirmed => false,
            Some(_) => true,
            None => {
                store.insert(message);
                true
            }
        }
    }

    pub fn update(&self, id: DabId, update: MessageUpdate) {
        self.lock().update(id, update);
    }

    pub fn get(&self, id: DabId) -> Option<Message> {
        self.lock().find(id).cloned()
    }

    pub fn all(&self) -> Vec<Message> {
        self.lock().all().to_vec()
    }

    pub fn begin_retry_pass(&self) -> Vec<RetrySeed> {
        self.lock().begin_retry_pass()
    }

    pub fn take_undelivered(&self, valid: bool) -> Vec<Vec<String>> {
        self.lock().take_undelivered(valid)
    }

    pub fn take_by_category(&self, category: Category, valid: bool) -> Vec<Vec<String>> {
        self.lock().take_by_category(category, valid)
    }
}
