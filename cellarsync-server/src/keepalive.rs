//! Self-ping that keeps free-tier hosts from idling the service.

use cellarsync_google::GoogleResult;
use reqwest::Client;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

/// Issues one GET to `url`. Returns whether it got a success status.
pub async fn ping(client: &Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => {
            debug!("keep-alive ping ok: {}", resp.status());
            true
        }
        Ok(resp) => {
            warn!("keep-alive ping to {url} returned {}", resp.status());
            false
        }
        Err(e) => {
            warn!("keep-alive ping to {url} failed: {e}");
            false
        }
    }
}

/// Pings `url` every `every`, starting one period from now.
pub fn spawn_keepalive(client: Client, url: String, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            ping(&client, &url).await;
        }
    })
}

/// Starts the keep-alive loop when a target is configured and the HTTP client
/// was built. Either failure only disables the ping.
pub fn start_keepalive(
    url: Option<&str>,
    client: GoogleResult<Client>,
    every: Duration,
) -> Option<JoinHandle<()>> {
    let Some(url) = url else {
        warn!("no keep-alive URL configured, self-ping disabled");
        return None;
    };
    match client {
        Ok(client) => {
            info!("keep-alive enabled: {url} every {}s", every.as_secs());
            Some(spawn_keepalive(client, url.to_string(), every))
        }
        Err(e) => {
            error!("keep-alive disabled, HTTP client unavailable: {e}");
            None
        }
    }
}
