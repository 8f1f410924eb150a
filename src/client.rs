use crate::handlers::http_client;
use crate::models::WhoisRecord;
use crate::response::ApiEnvelope;
use crate::validation::Asn;
use anyhow::{bail, Context as AnyhowContext};
use reqwest::{
    header::{ACCEPT, USER_AGENT},
    Client,
};

/// Client for a deployed instance of this proxy, as used by the map front end.
pub struct WhoisApiClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl WhoisApiClient {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        })
    }

    pub fn as_whois_url(&self, asn: &Asn) -> String {
        format!("{}/api/as/{}/whois", self.base_url, asn)
    }

    /// WHOIS records for every prefix `asn` originates.
    pub async fn as_whois(&self, asn: &Asn) -> anyhow::Result<Vec<WhoisRecord>> {
        let url = self.as_whois_url(asn);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .context("Failed to fetch WHOIS data")?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            bail!("Failed to fetch WHOIS data: HTTP error! status: {}", status);
        }

        let text = response
            .text()
            .await
            .context("Failed to read WHOIS response body")?;

        decode_as_whois(&text)
    }
}

fn decode_as_whois(text: &str) -> anyhow::Result<Vec<WhoisRecord>> {
    let envelope: ApiEnvelope<Vec<WhoisRecord>> =
        serde_json::from_str(text).context("WHOIS response is not a valid API envelope")?;
    envelope.into_result()
}
