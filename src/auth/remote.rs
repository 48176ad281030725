use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::{TokenVerifier, User, VerifyError};

const VERIFY_PATH: &str = "/v1/tokens/verify";

#[derive(Debug, Error)]
pub enum VerifierSetupError {
    #[error("invalid token authority URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    id: i64,
    activated: bool,
    #[serde(default)]
    permissions: Vec<String>,
}

/// [`TokenVerifier`] that asks the token authority over HTTP/JSON:
/// `POST {base}/v1/tokens/verify` with `{"token": "..."}`.
pub struct HttpTokenVerifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTokenVerifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, VerifierSetupError> {
        let endpoint = Url::parse(base_url)?.join(VERIFY_PATH)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify_token(&self, token: &str) -> Result<User, VerifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&VerifyRequest { token })
            .send()
            .await
            .map_err(|e| VerifyError::Other(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body: VerifyResponse = response
                    .json()
                    .await
                    .map_err(|e| VerifyError::Other(format!("undecodable authority response: {}", e)))?;
                Ok(User {
                    id: body.id,
                    activated: body.activated,
                    permissions: body.permissions.into_iter().collect(),
                })
            }
            StatusCode::UNAUTHORIZED => {
                tracing::warn!("Token authority rejected token");
                Err(VerifyError::Unauthenticated)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let detail = response.text().await.unwrap_or_default();
                tracing::warn!("Token authority reported malformed token: {}", detail);
                Err(VerifyError::InvalidArgument(detail))
            }
            status => Err(VerifyError::Other(format!("token authority responded with {}", status))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_joined_onto_base() {
        let verifier = HttpTokenVerifier::new("http://auth.internal:4001", Duration::from_secs(1)).unwrap();
        assert_eq!(verifier.endpoint().as_str(), "http://auth.internal:4001/v1/tokens/verify");
    }

    #[test]
    fn rejects_unparseable_base() {
        assert!(matches!(
            HttpTokenVerifier::new("not a url", Duration::from_secs(1)),
            Err(VerifierSetupError::InvalidUrl(_))
        ));
    }
}
