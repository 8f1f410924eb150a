use crate::error::ApiError;
use crate::handlers::{fetch_asn_whois, LookingGlass};
use crate::logger::LogLevel;
use crate::response::ApiReply;
use crate::validation::{parse_prefix_batch, require_json_content_type, Asn};
use chrono::{SecondsFormat, Utc};
use http::Method;
use serde_json::{json, Value};

/// The parts of an HTTP request the router looks at.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// URL path without the query string
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    Preflight,
    /// Raw, unvalidated ASN segment
    BgpPrefixes(&'a str),
    Whois,
    AsWhois(&'a str),
    Health,
    Documentation,
    NotFound,
}

impl<'a> Route<'a> {
    pub fn resolve(method: &Method, path: &'a str) -> Self {
        if method == Method::OPTIONS {
            return Route::Preflight;
        }

        if method == Method::GET {
            if let Some(asn) = path.strip_prefix("/api/bgp/") {
                return Route::BgpPrefixes(asn);
            }
            if let Some(rest) = path.strip_prefix("/api/as/") {
                if path.ends_with("/whois") {
                    // `/api/as/whois` reaches the ASN check as "whois"
                    return Route::AsWhois(rest.strip_suffix("/whois").unwrap_or(rest));
                }
            }
            match path {
                "/api/health" => return Route::Health,
                "/" | "/api" => return Route::Documentation,
                _ => {}
            }
        }

        if method == Method::POST && path == "/api/whois" {
            return Route::Whois;
        }

        Route::NotFound
    }
}

/// Produces exactly one response for `req`. Never fails: errors become envelopes.
pub async fn handle<L>(req: &ApiRequest, looking_glass: &L, log_level: LogLevel) -> ApiReply
where
    L: LookingGlass + ?Sized,
{
    let route = Route::resolve(&req.method, &req.path);
    log_debug!(log_level, "{} {} resolved to {:?}", req.method, req.path, route);

    if route == Route::Preflight {
        return ApiReply::preflight();
    }

    match dispatch(route, req, looking_glass).await {
        Ok(reply) => reply,
        Err(err) => {
            match &err {
                ApiError::Upstream(_) | ApiError::Internal(_) => {
                    log_error!("API Error on {} {}: {}", req.method, req.path, err)
                }
                _ => log_info!("Rejected {} {}: {}", req.method, req.path, err),
            }
            ApiReply::from_error(&err)
        }
    }
}

async fn dispatch<L>(route: Route<'_>, req: &ApiRequest, looking_glass: &L) -> Result<ApiReply, ApiError>
where
    L: LookingGlass + ?Sized,
{
    match route {
        Route::BgpPrefixes(raw) => {
            let asn = Asn::parse(raw)?;
            let prefixes = looking_glass.fetch_bgp_prefixes(&asn).await?;
            Ok(ApiReply::success(
                json!({ "prefixes": to_value(&prefixes)? }),
                Some(format!("BGP prefixes for AS{}", asn)),
            ))
        }
        Route::Whois => {
            require_json_content_type(req.content_type.as_deref())?;
            let prefixes = parse_prefix_batch(&req.body)?;
            let records = looking_glass.fetch_whois(&prefixes).await?;
            Ok(ApiReply::success(
                to_value(&records)?,
                Some(format!("WHOIS data for {} prefixes", prefixes.len())),
            ))
        }
        Route::AsWhois(raw) => {
            let asn = Asn::parse(raw)?;
            let records = fetch_asn_whois(looking_glass, &asn).await?;
            Ok(ApiReply::success(
                to_value(&records)?,
                Some(format!("AS{} prefixes with WHOIS information", asn)),
            ))
        }
        Route::Health => Ok(ApiReply::success(
            json!({
                "status": "healthy",
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
            None,
        )),
        Route::Documentation => Ok(ApiReply::success(documentation(), None)),
        Route::Preflight | Route::NotFound => Err(ApiError::NotFound),
    }
}

fn to_value<T: serde::Serialize>(data: &T) -> Result<Value, ApiError> {
    serde_json::to_value(data).map_err(|e| ApiError::Internal(e.into()))
}

fn documentation() -> Value {
    json!({
        "name": "HE.NET BGP WHOIS API",
        "description": "API service for fetching BGP and WHOIS information from HE.NET",
        "endpoints": {
            "GET /api/health": "Health check endpoint",
            "GET /api/bgp/:asn": "Get BGP prefixes for an ASN",
            "POST /api/whois": "Get WHOIS information for prefixes (body: {prefixes: string[]})",
            "GET /api/as/:asn/whois": "Get AS prefixes with WHOIS information"
        },
        "examples": {
            "BGP prefixes": "GET /api/bgp/6393",
            "WHOIS data": "POST /api/whois with body: {\"prefixes\": [\"1.1.1.0/24\"]}",
            "AS with WHOIS": "GET /api/as/6393/whois"
        }
    })
}
