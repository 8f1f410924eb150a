use serde::{Deserialize, Serialize};

/// One originated route for an ASN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRecord {
    pub prefix: String,
    pub count: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub code: String,
    pub rir: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BogonInfo {
    pub purpose: String,
    pub is_bogon: bool,
    pub status: String,
}

/// Registry metadata for one prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoisRecord {
    pub prefix: String,
    pub country: Country,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub registry: Registry,
    pub bogon_info: BogonInfo,
}

// Upstream shapes. Every field is optional; the adapters below fill defaults.

/// `GET .../prefixes/originated/{asn}`
#[derive(Debug, Default, Deserialize)]
pub struct HeNetBgpResponse {
    #[serde(default)]
    pub prefixes: Option<Vec<HeNetPrefix>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HeNetPrefix {
    #[serde(rename = "Prefix")]
    pub prefix: Option<String>,
    #[serde(rename = "Count")]
    pub count: Option<u64>,
    #[serde(rename = "Total")]
    pub total: Option<u64>,
}

/// `POST .../whois/prefixes`
#[derive(Debug, Default, Deserialize)]
pub struct HeNetWhoisResponse {
    #[serde(default)]
    pub response: Option<Vec<HeNetWhoisPrefix>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HeNetWhoisPrefix {
    pub countrydata: Option<HeNetCountry>,
    #[serde(rename = "CC")]
    pub cc: Option<String>,
    #[serde(rename = "Org")]
    pub org: Option<String>,
    #[serde(rename = "RIRData")]
    pub rir_data: Option<HeNetRir>,
    pub bogondata: Option<HeNetBogon>,
    #[serde(rename = "Prefix")]
    pub prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HeNetCountry {
    #[serde(rename = "Iso3166_Name")]
    pub name: Option<String>,
    #[serde(rename = "CC")]
    pub cc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HeNetRir {
    #[serde(rename = "CC")]
    pub cc: Option<String>,
    #[serde(rename = "RIR")]
    pub rir: Option<String>,
    #[serde(rename = "Prefix")]
    pub prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HeNetBogon {
    pub purpose: Option<String>,
    pub isbogon: Option<bool>,
    pub status: Option<String>,
}

/// Reason an upstream body could not be adapted at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Converts a BGP report into prefix records, dropping entries without a prefix.
pub fn adapt_prefixes(response: HeNetBgpResponse) -> Result<Vec<PrefixRecord>, MissingField> {
    let prefixes = response.prefixes.ok_or(MissingField("prefixes"))?;

    Ok(prefixes
        .into_iter()
        .filter_map(|raw| {
            Some(PrefixRecord {
                prefix: non_empty(raw.prefix)?,
                count: raw.count.unwrap_or_default(),
                total: raw.total.unwrap_or_default(),
            })
        })
        .collect())
}

/// Converts a WHOIS report into records, dropping entries without a prefix.
pub fn adapt_whois(response: HeNetWhoisResponse) -> Result<Vec<WhoisRecord>, MissingField> {
    let records = response.response.ok_or(MissingField("response"))?;

    Ok(records.into_iter().filter_map(adapt_whois_prefix).collect())
}

fn adapt_whois_prefix(raw: HeNetWhoisPrefix) -> Option<WhoisRecord> {
    let prefix = non_empty(raw.prefix)?;
    let country = raw.countrydata.unwrap_or_default();
    let rir = raw.rir_data.unwrap_or_default();
    let bogon = raw.bogondata.unwrap_or_default();

    Some(WhoisRecord {
        prefix,
        country: Country {
            name: country.name.unwrap_or_default(),
            code: non_empty(country.cc).or(non_empty(raw.cc)).unwrap_or_default(),
        },
        organization: non_empty(raw.org),
        registry: Registry {
            code: rir.cc.unwrap_or_default(),
            rir: rir.rir.unwrap_or_default(),
            prefix: rir.prefix.unwrap_or_default(),
        },
        bogon_info: BogonInfo {
            purpose: bogon.purpose.unwrap_or_default(),
            is_bogon: bogon.isbogon.unwrap_or_default(),
            status: bogon.status.unwrap_or_default(),
        },
    })
}
