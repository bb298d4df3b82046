//! Readiness check for the console under test
//!
//! The console is deployed elsewhere; the suite only checks that it answers
//! before a browser is launched, so an unreachable host fails fast with a
//! clear error instead of a navigation timeout in every test.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll `url` until it answers with anything other than a 5xx, or
/// `timeout` elapses.
pub async fn wait_until_reachable(url: &str, timeout: Duration, accept_invalid_certs: bool) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    while start.elapsed() < timeout {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if !resp.status().is_server_error() => {
                info!("{} is reachable ({})", url, resp.status());
                return Ok(());
            }
            Ok(resp) => {
                warn!("{} returned {}", url, resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} ...", url);
                }
                if !e.is_connect() && !e.is_timeout() {
                    warn!("Readiness check error: {}", e);
                }
            }
        }

        sleep(POLL_INTERVAL).await;
    }

    Err(E2eError::Unreachable {
        url: url.to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        // Bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{}/", port);

        let err = wait_until_reachable(&url, Duration::from_millis(300), false)
            .await
            .unwrap_err();
        match err {
            E2eError::Unreachable { url: u, attempts } => {
                assert_eq!(u, url);
                assert!(attempts >= 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
