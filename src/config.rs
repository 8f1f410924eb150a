use crate::logger::LogLevel;
use crate::validation::Asn;
use worker::Env;

pub const DEFAULT_HENET_API_BASE: &str = "https://bgp.he.net/super-lg/report/api/v1";
pub const DEFAULT_USER_AGENT: &str = "Network-HomePage/1.0";

/// Worker settings, read from `[vars]` in wrangler.toml.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Base of the HE.NET super-lg report API (`HENET_API_BASE`)
    pub henet_api_base: String,

    /// User-Agent sent on every upstream request (`USER_AGENT`)
    pub user_agent: String,

    /// Used when a request carries no `X-Log-Level` header (`LOG_LEVEL`)
    pub log_level: LogLevel,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            henet_api_base: DEFAULT_HENET_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: LogLevel::Info,
        }
    }
}

impl ProxyConfig {
    pub fn from_env(env: &Env) -> Self {
        Self::from_lookup(|name| env.var(name).ok().map(|var| var.to_string()))
    }

    /// Builds the config from any variable source. Unset or blank values keep the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            henet_api_base: get("HENET_API_BASE")
                .map(|base| base.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.henet_api_base),
            user_agent: get("USER_AGENT").unwrap_or(defaults.user_agent),
            log_level: get("LOG_LEVEL")
                .map(|level| LogLevel::from_header(&level))
                .unwrap_or(defaults.log_level),
        }
    }

    pub fn bgp_prefixes_url(&self, asn: &Asn) -> String {
        format!("{}/prefixes/originated/{}", self.henet_api_base, asn)
    }

    pub fn whois_prefixes_url(&self) -> String {
        format!("{}/whois/prefixes", self.henet_api_base)
    }
}
