use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ProfileConfig;
use crate::error::RelayError;
use crate::switch::{StatusWords, SwitchState};

use super::oauth::OAuthSigner;

const SHOW_USER_PATH: &str = "/1.1/users/show.json";
const UPDATE_PROFILE_PATH: &str = "/1.1/account/update_profile.json";

#[derive(Deserialize)]
struct User {
    description: Option<String>,
}

/// Rewrites the status suffix of an account's profile description.
pub struct ProfileForwarder {
    http: Client,
    signer: OAuthSigner,
    api_url: String,
    user_id: String,
    marker: String,
    words: StatusWords,
}

impl ProfileForwarder {
    pub fn new(http: Client, config: &ProfileConfig) -> Self {
        Self {
            http,
            signer: OAuthSigner::new(config.credentials.clone()),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            user_id: config.user_id.to_string(),
            marker: config.marker.clone(),
            words: config.words.clone(),
        }
    }

    /// Fetch the description, swap in the word for `state`, submit it.
    pub async fn forward(&self, state: SwitchState) -> Result<(), RelayError> {
        let current = self.fetch_description().await?;
        debug!("Profile {} current description: {}", self.user_id, current);

        let word = self.words.word_for(state)?;
        let updated = compose_description(&current, &self.marker, word);
        self.update_description(&updated).await?;
        info!("Profile new description: {}", updated);
        Ok(())
    }

    async fn fetch_description(&self) -> Result<String, RelayError> {
        let url = format!("{}{}", self.api_url, SHOW_USER_PATH);
        let params = [("user_id", self.user_id.as_str())];
        let auth = self.signer.authorization("GET", &url, &params)?;

        let user: User = self
            .http
            .get(&url)
            .query(&params)
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(user.description.unwrap_or_default())
    }

    async fn update_description(&self, description: &str) -> Result<(), RelayError> {
        let url = format!("{}{}", self.api_url, UPDATE_PROFILE_PATH);
        let params = [("description", description)];
        let auth = self.signer.authorization("POST", &url, &params)?;

        self.http
            .post(&url)
            .form(&params)
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Keep everything before the first `marker` (trailing whitespace dropped),
/// then append `marker` and `word`.
pub fn compose_description(current: &str, marker: &str, word: &str) -> String {
    let prefix = current
        .split(marker)
        .next()
        .unwrap_or_default()
        .trim_end();
    format!("{prefix} {marker} {word}")
}
