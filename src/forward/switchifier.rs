use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::config::SwitchifierConfig;
use crate::error::RelayError;
use crate::switch::SwitchState;

#[derive(Serialize)]
struct UpdateForm<'a> {
    secret: &'a str,
    value: i64,
}

/// Posts the switch state to a switchifier update endpoint.
pub struct SwitchifierForwarder {
    http: Client,
    url: String,
    secret: String,
    invert: bool,
}

impl SwitchifierForwarder {
    pub fn new(http: Client, config: &SwitchifierConfig) -> Self {
        Self {
            http,
            url: config.url.clone(),
            secret: config.secret.clone(),
            invert: config.invert,
        }
    }

    /// The sensor reads 1 for an open switch, the endpoint expects 1 for
    /// closed, so the value is negated unless inversion is disabled.
    pub fn outbound_value(&self, state: SwitchState) -> SwitchState {
        if self.invert { state.negated() } else { state }
    }

    /// Fire and forget: the response status is logged, never checked.
    pub async fn forward(&self, state: SwitchState) -> Result<(), RelayError> {
        let value = self.outbound_value(state);
        let form = UpdateForm {
            secret: &self.secret,
            value: value.raw(),
        };
        let response = self.http.post(&self.url).form(&form).send().await?;
        info!(
            "Switchifier update value={} answered {}",
            value,
            response.status()
        );
        Ok(())
    }
}
