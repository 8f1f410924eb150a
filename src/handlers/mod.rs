pub mod aggregate;
pub mod henet;

pub use aggregate::fetch_asn_whois;
pub use henet::HeNetClient;

use crate::error::UpstreamError;
use crate::models::{PrefixRecord, WhoisRecord};
use crate::validation::Asn;
use anyhow::Context as AnyhowContext;
use async_trait::async_trait;
use reqwest::Client;

/// Outbound HTTP client shared by every upstream caller.
pub(crate) fn http_client() -> anyhow::Result<Client> {
    // No timeout: not supported by reqwest on WebAssembly
    Client::builder()
        .build()
        .context("Failed to create HTTP client")
}

/// The two HE.NET report calls the router depends on.
///
/// Futures are not `Send`: the Workers runtime drives each request on a single thread.
#[async_trait(?Send)]
pub trait LookingGlass {
    /// Prefixes originated by `asn`, in upstream order.
    async fn fetch_bgp_prefixes(&self, asn: &Asn) -> Result<Vec<PrefixRecord>, UpstreamError>;

    /// WHOIS metadata for a batch of prefixes, sent as a single request.
    async fn fetch_whois(&self, prefixes: &[String]) -> Result<Vec<WhoisRecord>, UpstreamError>;
}
