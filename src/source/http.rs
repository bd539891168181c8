use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::debug;

use crate::source::traits::SourceError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub trait JsonFetcher {
    fn get_json(&self, url: &str) -> Result<Value, SourceError>;
}

impl<F: JsonFetcher + ?Sized> JsonFetcher for &F {
    fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        (**self).get_json(url)
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|err| SourceError::Fetch {
                url: String::new(),
                reason: format!("failed to build http client: {err}"),
            })?;
        Ok(Self { client })
    }
}

impl JsonFetcher for HttpFetcher {
    fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .map_err(|err| SourceError::Fetch {
                url: url.to_string(),
                reason: format!("network failure: {err}"),
            })?;
        parse_json_response(url, response)
    }
}

fn parse_json_response(url: &str, response: Response) -> Result<Value, SourceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().map_err(|err| SourceError::Fetch {
        url: url.to_string(),
        reason: format!("failed reading response body: {err}"),
    })?;

    // Content-Type is not trusted; every body is parsed as JSON.
    serde_json::from_str(&body).map_err(|err| {
        let snippet: String = body.chars().take(200).collect::<String>().replace('\n', " ");
        SourceError::Fetch {
            url: url.to_string(),
            reason: format!("invalid JSON ({err}); body starts with {snippet:?}"),
        }
    })
}
