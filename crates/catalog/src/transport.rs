use std::time::Duration;

use brandex_core::config::FeedConfig;
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("feed responded with HTTP status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(String),
}

/// One blocking fetch of the feed body. Implementations make a single attempt.
pub trait FeedTransport {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError>;
}

#[derive(Clone, Debug)]
pub struct FeedCredentials {
    pub username: String,
    pub password: Option<SecretString>,
}

pub struct HttpFeedTransport {
    client: Client,
    credentials: Option<FeedCredentials>,
}

impl HttpFeedTransport {
    pub fn new(credentials: Option<FeedCredentials>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("brandex-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| TransportError::Request(error.to_string()))?;
        Ok(Self { client, credentials })
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self, TransportError> {
        let credentials = config.username.as_ref().map(|username| FeedCredentials {
            username: username.clone(),
            password: config.password.clone(),
        });
        Self::new(credentials)
    }
}

impl FeedTransport for HttpFeedTransport {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut request = self.client.get(url).timeout(timeout);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(
                &credentials.username,
                credentials.password.as_ref().map(|password| password.expose_secret().to_owned()),
            );
        }

        let response = request.send().map_err(|error| map_request_error(error, timeout))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response.bytes().map_err(|error| map_request_error(error, timeout))?;
        debug!(event_name = "catalog.feed.fetched", url, bytes = body.len(), "feed body received");
        Ok(body.to_vec())
    }
}

fn map_request_error(error: reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use brandex_core::config::FeedConfig;
    use secrecy::ExposeSecret;

    use super::{FeedTransport, HttpFeedTransport};

    #[test]
    fn credentials_are_taken_from_config_only_with_username() {
        let anonymous = FeedConfig { url: None, username: None, password: None, timeout_secs: 5 };
        let transport = HttpFeedTransport::from_config(&anonymous).expect("client builds");
        assert!(transport.credentials.is_none());

        let authenticated = FeedConfig {
            url: None,
            username: Some("brandex".to_string()),
            password: Some("s3cret".to_string().into()),
            timeout_secs: 5,
        };
        let transport = HttpFeedTransport::from_config(&authenticated).expect("client builds");
        let credentials = transport.credentials.as_ref().expect("credentials present");
        assert_eq!(credentials.username, "brandex");
        assert_eq!(
            credentials.password.as_ref().map(|password| password.expose_secret().to_owned()),
            Some("s3cret".to_string())
        );
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let transport = HttpFeedTransport::new(None).expect("client builds");
        // Port 9 (discard) on localhost is closed in test environments.
        let result = transport.fetch("http://127.0.0.1:9/feed.xml", Duration::from_secs(2));

        assert!(result.is_err());
    }
}
