pub mod client;

/// A message received on the subscribed topic.
#[derive(Debug, Clone)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// What the subscriber hands to the relay loop, in arrival order.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// CONNACK received; `code` is the numeric connect return code.
    Connected { code: u8 },
    Message(MqttMessage),
}
