use super::{http_client, LookingGlass};
use crate::config::ProxyConfig;
use crate::error::{UpstreamError, UpstreamService};
use crate::logger::LogLevel;
use crate::models::{
    adapt_prefixes, adapt_whois, HeNetBgpResponse, HeNetWhoisResponse, PrefixRecord, WhoisRecord,
};
use crate::validation::Asn;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT},
    Client, Response,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Serialize)]
struct WhoisRequestBody<'a> {
    prefixes: &'a [String],
}

/// HE.NET super-lg report API client. Built once per incoming request.
pub struct HeNetClient {
    client: Client,
    config: ProxyConfig,
    log_level: LogLevel,
}

impl HeNetClient {
    pub fn new(config: ProxyConfig, log_level: LogLevel) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client()?,
            config,
            log_level,
        })
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        match HeaderValue::from_str(&self.config.user_agent) {
            Ok(value) => {
                headers.insert(USER_AGENT, value);
            }
            Err(_) => {
                log_error!(
                    "Configured user agent {:?} is not a valid header value, omitting it",
                    self.config.user_agent
                );
            }
        }
        headers
    }

    /// Checks the status and decodes the body of an upstream response.
    async fn read_json<T: DeserializeOwned>(
        &self,
        service: UpstreamService,
        response: Response,
    ) -> Result<T, UpstreamError> {
        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown Status");

        log_info!("{} responded with status: {} ({})", service, status, status_text);

        if !(200..300).contains(&status) {
            return Err(UpstreamError::Status { service, status });
        }

        let text = response
            .text()
            .await
            .map_err(|source| UpstreamError::Transport { service, source })?;

        log_debug!(self.log_level, "{} response body: {}", service, text);

        serde_json::from_str::<T>(&text).map_err(|e| UpstreamError::Decode {
            service,
            reason: e.to_string(),
        })
    }

    async fn bgp_prefixes(&self, asn: &Asn) -> Result<Vec<PrefixRecord>, UpstreamError> {
        let service = UpstreamService::Bgp;
        let url = self.config.bgp_prefixes_url(asn);
        log_debug!(self.log_level, "Sending GET request to {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { service, source })?;

        let report: HeNetBgpResponse = self.read_json(service, response).await?;
        adapt_prefixes(report).map_err(|missing| UpstreamError::Decode {
            service,
            reason: format!("missing field `{}`", missing.0),
        })
    }

    async fn whois(&self, prefixes: &[String]) -> Result<Vec<WhoisRecord>, UpstreamError> {
        let service = UpstreamService::Whois;
        let url = self.config.whois_prefixes_url();
        log_debug!(
            self.log_level,
            "Sending POST request to {} with {} prefixes: {:?}",
            url,
            prefixes.len(),
            prefixes
        );

        let mut headers = self.default_headers();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&WhoisRequestBody { prefixes })
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { service, source })?;

        let report: HeNetWhoisResponse = self.read_json(service, response).await?;
        adapt_whois(report).map_err(|missing| UpstreamError::Decode {
            service,
            reason: format!("missing field `{}`", missing.0),
        })
    }
}

#[async_trait(?Send)]
impl LookingGlass for HeNetClient {
    async fn fetch_bgp_prefixes(&self, asn: &Asn) -> Result<Vec<PrefixRecord>, UpstreamError> {
        self.bgp_prefixes(asn).await
    }

    async fn fetch_whois(&self, prefixes: &[String]) -> Result<Vec<WhoisRecord>, UpstreamError> {
        self.whois(prefixes).await
    }
}
