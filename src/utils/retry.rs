//! Retry handling for Azure Resource Manager calls
//!
//! This module wraps an outbound HTTP send so that transient failures are
//! retried transparently before the response is handed back to the caller.

use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{Result, SharebridgeError};
use crate::utils::network::RawResponse;

/// Marker the authorization service returns while a freshly created managed
/// identity has not yet replicated to it. Role assignments hitting this are
/// worth retrying even though the status code alone says otherwise.
pub const PRINCIPAL_NOT_FOUND_MARKER: &str = "PrincipalNotFound";

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(20),
        }
    }
}

/// Transient statuses: request timeout, throttling, and server errors other
/// than 501 and 505.
pub fn is_transient_status(status: StatusCode) -> bool {
    match status.as_u16() {
        408 | 429 => true,
        501 | 505 => false,
        code => (500..600).contains(&code),
    }
}

fn should_retry(response: &RawResponse) -> bool {
    is_transient_status(response.status) || response.body.contains(PRINCIPAL_NOT_FOUND_MARKER)
}

/// Send a request with bounded retries.
///
/// The send operation is re-invoked for up to `max_attempts` attempts with a
/// fixed delay between them. The retry decision is made before the delay: a
/// non-retryable failure returns immediately with the response as-is. When
/// attempts are exhausted the last failing response is returned unchanged —
/// no error is synthesized, callers must check `is_success` themselves.
///
/// Transport errors abort the current attempt and propagate. Cancellation
/// during the send or the delay surfaces as [`SharebridgeError::Cancelled`].
pub async fn send_with_retry<F, Fut>(
    mut send: F,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<RawResponse>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<RawResponse>>,
{
    let mut last_response = None;

    for attempt in 1..=policy.max_attempts {
        let response = tokio::select! {
            response = send() => response?,
            _ = cancel.cancelled() => return Err(SharebridgeError::Cancelled),
        };

        if response.is_success() {
            return Ok(response);
        }

        if !should_retry(&response) {
            return Ok(response);
        }

        warn!(
            status = %response.status,
            attempt,
            max_attempts = policy.max_attempts,
            "retryable failure from management endpoint"
        );
        last_response = Some(response);

        if attempt < policy.max_attempts {
            tokio::select! {
                _ = sleep(policy.retry_delay) => {}
                _ = cancel.cancelled() => return Err(SharebridgeError::Cancelled),
            }
        }
    }

    last_response.ok_or_else(|| {
        SharebridgeError::invalid_argument("retry policy must allow at least one attempt")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }
    }

    /// A send operation that walks through the given responses, repeating
    /// the last one, and counts invocations.
    fn scripted_send(
        responses: Vec<(u16, &'static str)>,
        calls: Arc<AtomicU32>,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<RawResponse>> + Send>>
    {
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst) as usize;
            let (status, body) = responses[call.min(responses.len() - 1)];
            let fut: std::pin::Pin<
                Box<dyn std::future::Future<Output = Result<RawResponse>> + Send>,
            > = Box::pin(async move { Ok(response(status, body)) });
            fut
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_sends_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let send = scripted_send(vec![(200, "{}")], Arc::clone(&calls));

        let result = send_with_retry(send, &RetryPolicy::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_server_error_is_bounded_to_three_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let send = scripted_send(vec![(503, "unavailable")], Arc::clone(&calls));
        let started = tokio::time::Instant::now();

        let result = send_with_retry(send, &RetryPolicy::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two 20-second waits between the three attempts, none after the last.
        assert_eq!(started.elapsed(), Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_failure_short_circuits() {
        let calls = Arc::new(AtomicU32::new(0));
        let send = scripted_send(vec![(403, "forbidden")], Arc::clone(&calls));

        let result = send_with_retry(send, &RetryPolicy::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn principal_not_found_body_is_retried_despite_status() {
        let calls = Arc::new(AtomicU32::new(0));
        let body = r#"{"error":{"code":"PrincipalNotFound","message":"Principal does not exist"}}"#;
        let send = scripted_send(vec![(404, body)], Arc::clone(&calls));

        let result = send_with_retry(send, &RetryPolicy::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, StatusCode::NOT_FOUND);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_delay_stops_without_another_send() {
        let calls = Arc::new(AtomicU32::new(0));
        let send = scripted_send(vec![(503, "unavailable")], Arc::clone(&calls));

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(5)).await;
            canceller.cancel();
        });

        let result = send_with_retry(send, &RetryPolicy::default(), &cancel).await;

        assert!(matches!(result, Err(SharebridgeError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_single_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let send = scripted_send(vec![(500, "boom"), (200, "{}")], Arc::clone(&calls));
        let started = tokio::time::Instant::now();

        let result = send_with_retry(send, &RetryPolicy::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[test]
    fn transient_status_classification() {
        assert!(is_transient_status(StatusCode::REQUEST_TIMEOUT));
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_transient_status(StatusCode::NOT_IMPLEMENTED));
        assert!(!is_transient_status(StatusCode::HTTP_VERSION_NOT_SUPPORTED));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::CONFLICT));
    }
}
