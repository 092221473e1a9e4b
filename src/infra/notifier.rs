//! Notifier that records messages instead of sending them.
//!
//! Stands in for email/SMS/push transports in development and tests.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{DeliveryHandle, Notifier, OutreachMessage, SchedulingError};
use crate::util::serde::Channel;

/// A message the notifier accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Channel used.
    pub channel: Channel,
    /// Message body.
    pub message: OutreachMessage,
    /// Receipt handed back to the caller.
    pub handle: DeliveryHandle,
}

/// Records every send; channels marked failing refuse delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    failing: Mutex<HashSet<Channel>>,
}

impl RecordingNotifier {
    /// Create a notifier that accepts every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send over `channel` fail.
    pub fn fail_channel(&self, channel: Channel) {
        self.failing.lock().insert(channel);
    }

    /// Let `channel` deliver again.
    pub fn restore_channel(&self, channel: Channel) {
        self.failing.lock().remove(&channel);
    }

    /// Messages accepted so far, in send order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Coach ids contacted, in send order.
    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|s| s.message.coach_id.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        coach_id: &str,
        channel: Channel,
        message: &OutreachMessage,
    ) -> Result<DeliveryHandle, SchedulingError> {
        if self.failing.lock().contains(&channel) {
            return Err(SchedulingError::Delivery(format!(
                "{channel} transport refused message for {coach_id}"
            )));
        }
        let handle = DeliveryHandle {
            id: uuid::Uuid::new_v4(),
            coach_id: coach_id.to_string(),
            channel,
        };
        self.sent.lock().push(SentMessage {
            channel,
            message: message.clone(),
            handle: handle.clone(),
        });
        Ok(handle)
    }
}
