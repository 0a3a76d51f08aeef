//! Client for the UCSC Genome Browser REST API (`/getData/sequence`).

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

use crate::error::{Error, Result};

use super::SequenceSource;

/// Public UCSC REST API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.genome.ucsc.edu";

/// Configuration of the [`UcscClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UcscConfig {
    /// Base URL of the API, without trailing slash.
    pub base_url: String,
    /// Overall timeout of a single request.
    pub timeout: Duration,
}

impl Default for UcscConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// JSON body returned by `/getData/sequence`.
///
/// Only the fields we need are declared; UCSC sends additional metadata.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SequenceResponse {
    /// The bases, if the request succeeded.
    pub dna: Option<String>,
    /// Error text reported by the service.
    pub error: Option<String>,
}

impl SequenceResponse {
    /// Extract the sequence or convert the reported error into `Error::Api`.
    pub fn into_sequence(self) -> Result<String> {
        match self.dna {
            Some(dna) => Ok(dna),
            None => Err(Error::Api(
                self.error.unwrap_or_else(|| "Unknown Error".to_string()),
            )),
        }
    }
}

/// Blocking HTTP client for the UCSC sequence endpoint.
#[derive(Debug, Clone)]
pub struct UcscClient {
    client: Client,
    config: UcscConfig,
}

impl UcscClient {
    pub fn new(config: UcscConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("vareon/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// The request URL for `[start, end)`.
    ///
    /// UCSC separates query parameters with `;`.
    pub fn sequence_url(&self, genome: &str, chromosome: &str, start: u64, end: u64) -> String {
        format!(
            "{}/getData/sequence?genome={};chrom={};start={};end={}",
            self.config.base_url.trim_end_matches('/'),
            genome,
            chromosome,
            start,
            end
        )
    }
}

impl SequenceSource for UcscClient {
    fn fetch(&self, genome: &str, chromosome: &str, start: u64, end: u64) -> Result<String> {
        let url = self.sequence_url(genome, chromosome, start, end);
        tracing::debug!("GET {}", &url);

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Service {
                status: status.as_u16(),
            });
        }

        response.json::<SequenceResponse>()?.into_sequence()
    }
}
