use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::MqttConfig;
use crate::error::RelayError;

use super::{MqttMessage, RelayEvent};

/// Delay before polling again after a dropped connection.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub struct MqttClient {
    client: AsyncClient,
    eventloop: EventLoop,
    topic: String,
}

impl MqttClient {
    pub fn new(config: &MqttConfig) -> Self {
        let mut mqttopts =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        mqttopts.set_keep_alive(Duration::from_secs(u64::from(config.keepalive_secs)));

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            mqttopts.set_credentials(user, pass);
        }

        let (client, eventloop) = AsyncClient::new(mqttopts, 100);

        Self {
            client,
            eventloop,
            topic: config.topic.clone(),
        }
    }

    /// Run the MQTT event loop. Subscribes to the topic on every connect and
    /// forwards connect and publish events through `event_tx`.
    ///
    /// Returns an error if the first connection attempt fails. Later
    /// disconnects are retried by polling again after [`RECONNECT_DELAY`].
    /// Returns `Ok` once the receiving side has gone away.
    pub async fn run(mut self, event_tx: mpsc::Sender<RelayEvent>) -> Result<(), RelayError> {
        let mut connected_once = false;

        loop {
            match self.eventloop.poll().await {
                Ok(event) => {
                    let Some(relay_event) = relay_event(&event) else {
                        continue;
                    };
                    if let RelayEvent::Connected { code } = relay_event {
                        connected_once = true;
                        info!("MQTT connected with result code {}", code);
                        self.client.subscribe(&self.topic, QoS::AtMostOnce).await?;
                        info!("MQTT topic subscribed: {}", self.topic);
                    }
                    if event_tx.send(relay_event).await.is_err() {
                        return Ok(());
                    }
                }
                Err(e) if !connected_once => return Err(e.into()),
                Err(e) => {
                    error!("MQTT connection error: {}. Reconnecting...", e);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}

/// The events the relay cares about; everything else is client bookkeeping.
fn relay_event(event: &Event) -> Option<RelayEvent> {
    match event {
        Event::Incoming(Incoming::ConnAck(connack)) => Some(RelayEvent::Connected {
            code: connack.code as u8,
        }),
        Event::Incoming(Incoming::Publish(publish)) => Some(RelayEvent::Message(MqttMessage {
            topic: publish.topic.clone(),
            payload: publish.payload.to_vec(),
        })),
        _ => None,
    }
}
