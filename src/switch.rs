use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{DecodeError, RelayError};

/// Position reported by the switch sensor. Booleans normalize to 0/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwitchState(i64);

impl SwitchState {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    /// Logical negation: 0 becomes 1, anything else becomes 0.
    pub fn negated(self) -> Self {
        Self(i64::from(self.0 == 0))
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<bool> for SwitchState {
    fn from(b: bool) -> Self {
        Self(i64::from(b))
    }
}

impl FromStr for SwitchState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "true" => Ok(true.into()),
            "false" => Ok(false.into()),
            other => other
                .parse::<i64>()
                .map(Self)
                .map_err(|_| format!("invalid switch state '{s}'")),
        }
    }
}

#[derive(Deserialize)]
struct Reading {
    value: Option<serde_json::Value>,
}

/// Decode an MQTT payload of the form `{"value": <bool|int>}`.
pub fn decode_payload(payload: &[u8]) -> Result<SwitchState, DecodeError> {
    let reading: Reading = serde_json::from_slice(payload)?;
    let value = reading.value.ok_or(DecodeError::MissingValue)?;

    match &value {
        serde_json::Value::Bool(b) => Ok((*b).into()),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(SwitchState(i));
            }
            // 1.0 is accepted as 1, 0.5 is not
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(SwitchState(f as i64))
                }
                _ => Err(DecodeError::InvalidValue(value.clone())),
            }
        }
        serde_json::Value::Null => Err(DecodeError::MissingValue),
        _ => Err(DecodeError::InvalidValue(value.clone())),
    }
}

/// Last switch state the relay acted on.
#[derive(Debug, Default)]
pub struct StateTracker {
    current: Option<SwitchState>,
}

impl StateTracker {
    pub fn new(initial: Option<SwitchState>) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> Option<SwitchState> {
        self.current
    }

    /// An unset tracker reports every state as a change.
    pub fn has_changed(&self, state: SwitchState) -> bool {
        self.current != Some(state)
    }

    pub fn record(&mut self, state: SwitchState) {
        self.current = Some(state);
    }
}

/// Words appended to the profile description, indexed by state.
#[derive(Debug, Clone)]
pub struct StatusWords {
    pub open: String,
    pub closed: String,
}

impl StatusWords {
    pub fn word_for(&self, state: SwitchState) -> Result<&str, RelayError> {
        match state.raw() {
            0 => Ok(&self.open),
            1 => Ok(&self.closed),
            _ => Err(RelayError::UnsupportedState(state)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_integer_and_boolean_values() {
        assert_eq!(decode_payload(br#"{"value": 1}"#).unwrap(), SwitchState::new(1));
        assert_eq!(decode_payload(br#"{"value": 0}"#).unwrap(), SwitchState::new(0));
        assert_eq!(decode_payload(br#"{"value": true}"#).unwrap(), SwitchState::new(1));
        assert_eq!(decode_payload(br#"{"value": false}"#).unwrap(), SwitchState::new(0));
        assert_eq!(decode_payload(br#"{"value": 1.0}"#).unwrap(), SwitchState::new(1));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let payload = br#"{"sensor": "knife_switch_ca750200", "value": 0, "rssi": -61}"#;
        assert_eq!(decode_payload(payload).unwrap(), SwitchState::new(0));
    }

    #[test]
    fn missing_or_null_value_is_rejected() {
        assert!(matches!(
            decode_payload(br#"{"state": 1}"#),
            Err(DecodeError::MissingValue)
        ));
        assert!(matches!(
            decode_payload(br#"{"value": null}"#),
            Err(DecodeError::MissingValue)
        ));
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(matches!(decode_payload(b"not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode_payload(b"42"), Err(DecodeError::Json(_))));
        assert!(matches!(
            decode_payload(br#"{"value": "1"}"#),
            Err(DecodeError::InvalidValue(_))
        ));
        assert!(matches!(
            decode_payload(br#"{"value": 0.5}"#),
            Err(DecodeError::InvalidValue(_))
        ));
    }

    #[test]
    fn negation() {
        assert_eq!(SwitchState::new(0).negated(), SwitchState::new(1));
        assert_eq!(SwitchState::new(1).negated(), SwitchState::new(0));
        assert_eq!(SwitchState::new(7).negated(), SwitchState::new(0));
    }

    #[test]
    fn parses_configured_state() {
        assert_eq!("1".parse::<SwitchState>().unwrap(), SwitchState::new(1));
        assert_eq!(" 0 ".parse::<SwitchState>().unwrap(), SwitchState::new(0));
        assert_eq!("True".parse::<SwitchState>().unwrap(), SwitchState::new(1));
        assert!("open".parse::<SwitchState>().is_err());
    }

    #[test]
    fn tracker_reports_changes() {
        let mut tracker = StateTracker::new(None);
        assert!(tracker.has_changed(SwitchState::new(0)));

        tracker.record(SwitchState::new(0));
        assert!(!tracker.has_changed(SwitchState::new(0)));
        assert!(tracker.has_changed(SwitchState::new(1)));
        assert_eq!(tracker.current(), Some(SwitchState::new(0)));
    }

    #[test]
    fn status_words_cover_zero_and_one_only() {
        let words = StatusWords {
            open: "OPEN".into(),
            closed: "CLOSED".into(),
        };
        assert_eq!(words.word_for(SwitchState::new(0)).unwrap(), "OPEN");
        assert_eq!(words.word_for(SwitchState::new(1)).unwrap(), "CLOSED");
        assert!(matches!(
            words.word_for(SwitchState::new(2)),
            Err(RelayError::UnsupportedState(s)) if s == SwitchState::new(2)
        ));
    }
}
