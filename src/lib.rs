use worker::*;

#[macro_use]
mod logger;

pub mod client;
mod config;
mod error;
mod handlers;
pub mod models;
pub mod nodes;
mod response;
mod router;
#[cfg(test)]
mod test_support;
mod validation;

pub use client::WhoisApiClient;
pub use error::{ApiError, UpstreamError, UpstreamService, ValidationError};
pub use handlers::{fetch_asn_whois, HeNetClient, LookingGlass};
pub use nodes::{HttpNodeSource, NodeDirectory, NodeSource};
pub use response::ApiEnvelope;
pub use validation::Asn;

use config::ProxyConfig;
use logger::LogLevel;
use response::ApiReply;
use router::ApiRequest;

#[event(fetch)]
async fn fetch(req: HttpRequest, env: Env, _ctx: Context) -> Result<HttpResponse> {
    console_error_panic_hook::set_once();

    let config = ProxyConfig::from_env(&env);

    // X-Log-Level header overrides the configured level for this request
    let log_level = req
        .headers()
        .get("X-Log-Level")
        .and_then(|value| value.to_str().ok())
        .map(LogLevel::from_header)
        .unwrap_or(config.log_level);

    let reply = match serve(req, config, log_level).await {
        Ok(reply) => reply,
        Err(e) => {
            log_error!("Request failed before routing: {:#}", e);
            ApiReply::from_error(&ApiError::Internal(e))
        }
    };

    log_info!("Responding with status {}", reply.status);
    into_response(reply)?.try_into()
}

/// Reads the incoming request and runs it through the router.
async fn serve(req: HttpRequest, config: ProxyConfig, log_level: LogLevel) -> anyhow::Result<ApiReply> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let content_type = req
        .headers()
        .get("Content-Type")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    // Convert HttpRequest to worker::Request to read the body
    let mut worker_req =
        Request::try_from(req).map_err(|e| anyhow::anyhow!("Failed to read request: {}", e))?;

    let colo = worker_req.cf().map(|cf| cf.colo()).unwrap_or("unknown".to_string());
    log_info!("{} {} received at datacenter: {}", method, path, colo);

    let body = worker_req
        .text()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read request body: {}", e))?;

    let request = ApiRequest {
        method,
        path,
        content_type,
        body,
    };

    let looking_glass = HeNetClient::new(config, log_level)?;
    Ok(router::handle(&request, &looking_glass, log_level).await)
}

/// Converts a router reply into a Workers response.
fn into_response(reply: ApiReply) -> Result<Response> {
    let headers = Headers::new();
    for (name, value) in reply.headers.iter() {
        if let Ok(value) = value.to_str() {
            headers.set(name.as_str(), value)?;
        }
    }

    let body = reply
        .body_text()
        .map_err(|e| Error::RustError(format!("Failed to serialize response: {}", e)))?;

    let response = match body {
        Some(text) => Response::ok(text)?,
        None => Response::empty()?,
    };

    Ok(response
        .with_status(reply.status.as_u16())
        .with_headers(headers))
}
