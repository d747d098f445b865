pub mod oauth;
pub mod profile;
pub mod switchifier;

use reqwest::Client;

use crate::config::ForwardConfig;
use crate::error::RelayError;

use self::profile::ProfileForwarder;
use self::switchifier::SwitchifierForwarder;

/// The one outbound integration a relay instance drives.
pub enum Forwarder {
    Profile(ProfileForwarder),
    Switchifier(SwitchifierForwarder),
}

impl Forwarder {
    pub fn from_config(config: &ForwardConfig) -> Result<Self, RelayError> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(match config {
            ForwardConfig::Profile(profile) => Self::Profile(ProfileForwarder::new(http, profile)),
            ForwardConfig::Switchifier(switchifier) => {
                Self::Switchifier(SwitchifierForwarder::new(http, switchifier))
            }
        })
    }
}
