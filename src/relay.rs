use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::RelayError;
use crate::forward::Forwarder;
use crate::mqtt::{MqttMessage, RelayEvent};
use crate::switch::{StateTracker, decode_payload};

/// Result of handling one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Forwarded,
}

/// Change detection in front of a single forwarder.
pub struct Relay {
    tracker: StateTracker,
    forwarder: Forwarder,
}

impl Relay {
    pub fn new(tracker: StateTracker, forwarder: Forwarder) -> Self {
        Self { tracker, forwarder }
    }

    /// Consume events until the subscriber goes away or a message fails.
    pub async fn run(mut self, mut events: mpsc::Receiver<RelayEvent>) -> Result<(), RelayError> {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await?;
        }
        Ok(())
    }

    pub async fn dispatch(&mut self, event: RelayEvent) -> Result<(), RelayError> {
        match event {
            RelayEvent::Connected { code } => {
                debug!(
                    "Broker session ready (code {}), tracked state {:?}",
                    code,
                    self.tracker.current()
                );
            }
            RelayEvent::Message(msg) => {
                self.handle_message(&msg).await?;
            }
        }
        Ok(())
    }

    pub async fn handle_message(&mut self, msg: &MqttMessage) -> Result<Outcome, RelayError> {
        let state = decode_payload(&msg.payload)?;
        debug!("Current switch status on {}: {}", msg.topic, state);

        if !self.tracker.has_changed(state) {
            debug!("No changes.");
            return Ok(Outcome::Unchanged);
        }

        match self.tracker.current() {
            Some(previous) => info!("Switch changed from {} to {}", previous, state),
            None => info!("Switch state is now {}", state),
        }

        match &self.forwarder {
            // Profile records before forwarding, switchifier after.
            Forwarder::Profile(profile) => {
                self.tracker.record(state);
                profile.forward(state).await?;
            }
            Forwarder::Switchifier(switchifier) => {
                switchifier.forward(state).await?;
                self.tracker.record(state);
            }
        }
        Ok(Outcome::Forwarded)
    }
}
