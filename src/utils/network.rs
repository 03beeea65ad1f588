use crate::error::{Result, SharebridgeError};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Configuration for the HTTP client with proper timeouts
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: format!("sharebridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| SharebridgeError::network(format!("Failed to create HTTP client: {}", e)))
}

/// A fully buffered HTTP response.
///
/// The retry layer has to inspect response bodies to classify failures, so
/// every management call reads the body eagerly and hands this around
/// instead of a streaming response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Human-readable error text: the ARM `error.message` when the body
    /// carries one, the raw body otherwise.
    pub fn error_message(&self) -> String {
        arm_error_message(&self.body).unwrap_or_else(|| self.body.clone())
    }
}

/// Buffer a response into a [`RawResponse`], consuming the body
pub async fn read_response(response: reqwest::Response) -> Result<RawResponse> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Ok(RawResponse { status, body })
}

/// Extract the `error.message` field from an ARM error body
pub fn arm_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
}

/// Network error classification with user-friendly error messages
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> SharebridgeError {
    let host = extract_host(url);

    if error.is_timeout() {
        return SharebridgeError::connection_timeout(format!(
            "Request to '{}' timed out. This might be due to network issues or the endpoint being unreachable.",
            host
        ));
    }

    if error.is_connect() {
        if is_dns_resolution_error(error) {
            return SharebridgeError::dns_resolution(
                host.clone(),
                format!(
                    "Unable to resolve '{}'. Please check the configured management endpoint.",
                    host
                ),
            );
        }

        if error
            .to_string()
            .to_lowercase()
            .contains("connection refused")
        {
            return SharebridgeError::connection_refused(format!(
                "Connection to '{}' was refused. The service may be temporarily unavailable.",
                host
            ));
        }

        return SharebridgeError::network(format!(
            "Failed to connect to '{}'. Please check your network connection.",
            host
        ));
    }

    let message = error.to_string().to_lowercase();
    if message.contains("ssl") || message.contains("tls") || message.contains("certificate") {
        return SharebridgeError::ssl_error(format!(
            "SSL/TLS connection error when contacting '{}'.",
            host
        ));
    }

    if error.is_request() {
        return SharebridgeError::invalid_url(format!(
            "Invalid request to '{}'. Please check the endpoint configuration.",
            host
        ));
    }

    SharebridgeError::network(format!(
        "Network error when contacting '{}': {}. Please check your internet connection and try again.",
        host, error
    ))
}

/// DNS failure detection from transport error text
fn is_dns_resolution_error(error: &reqwest::Error) -> bool {
    let error_msg = error.to_string().to_lowercase();
    let dns_indicators = [
        "dns",
        "name resolution",
        "resolve",
        "lookup",
        "name or service not known",
        "nodename nor servname provided",
        "temporary failure in name resolution",
        "no such host",
        "host not found",
        "getaddrinfo failed",
        "could not resolve host",
    ];

    dns_indicators
        .iter()
        .any(|&indicator| error_msg.contains(indicator))
}

/// Extract the host portion of a URL for error messages
fn extract_host(url: &str) -> String {
    if let Ok(parsed_url) = url::Url::parse(url) {
        if let Some(host) = parsed_url.host_str() {
            return host.to_string();
        }
    }

    "unknown-host".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host() {
        let url = "https://management.azure.com/subscriptions/abc/resourcegroups/rg?api-version=2021-04-01";
        assert_eq!(extract_host(url), "management.azure.com");
        assert_eq!(extract_host("not a url"), "unknown-host");
    }

    #[test]
    fn test_arm_error_message() {
        let body = r#"{"error":{"code":"AuthorizationFailed","message":"The client does not have authorization."}}"#;
        assert_eq!(
            arm_error_message(body),
            Some("The client does not have authorization.".to_string())
        );

        assert_eq!(arm_error_message("plain text failure"), None);
        assert_eq!(arm_error_message(r#"{"message":"no error wrapper"}"#), None);
    }

    #[test]
    fn test_raw_response_error_message_falls_back_to_body() {
        let response = RawResponse {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream unavailable".to_string(),
        };
        assert_eq!(response.error_message(), "upstream unavailable");
    }
}
