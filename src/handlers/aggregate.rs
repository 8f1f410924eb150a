use super::LookingGlass;
use crate::error::UpstreamError;
use crate::models::WhoisRecord;
use crate::validation::Asn;

/// WHOIS metadata for every prefix `asn` originates.
///
/// The BGP report is fetched first and its prefixes are forwarded in one WHOIS
/// batch, in order and with duplicates kept. The direct endpoint's batch cap
/// does not apply here. Either call failing fails the whole lookup.
pub async fn fetch_asn_whois<L>(looking_glass: &L, asn: &Asn) -> Result<Vec<WhoisRecord>, UpstreamError>
where
    L: LookingGlass + ?Sized,
{
    let prefixes: Vec<String> = looking_glass
        .fetch_bgp_prefixes(asn)
        .await?
        .into_iter()
        .map(|record| record.prefix)
        .collect();

    if prefixes.is_empty() {
        return Ok(Vec::new());
    }

    looking_glass.fetch_whois(&prefixes).await
}
