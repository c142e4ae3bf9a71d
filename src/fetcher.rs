use crate::debug_println;
use crate::error::{ListingsError, Result};
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::thread;
use std::time::Duration;

pub const BASE_URL: &str = "https://www.theocc.com";
pub const ENTRY_PAGE: &str =
    "https://www.theocc.com/market-data/market-data-reports/series-and-trading-data/new-listings";

// The portal rejects requests without a browser-looking User-Agent.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0 Safari/537.36";
const ACCEPT: &str =
    "text/html,application/json,application/xml,text/csv,text/plain;q=0.9,*/*;q=0.8";

/// Resolves URLs to their textual content. The pipeline never talks HTTP
/// directly; retries, cookies and challenge detection all live behind this
/// trait so tests can substitute canned documents.
pub trait DocumentFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        self.fetch_with_query(url, &[])
    }

    fn fetch_with_query(&self, url: &str, params: &[(String, String)]) -> Result<String>;
}

/// Production fetcher: blocking reqwest client with a cookie store and a
/// bounded retry loop. Transient failures (connect errors, 5xx) are retried
/// with a jittered backoff; anti-bot challenges are fatal immediately.
pub struct HttpFetcher {
    client: Client,
    max_attempts: u32,
}

impl HttpFetcher {
    pub fn new(max_attempts: u32) -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch_with_query(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        let mut last_detail = String::from("request failed");

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = backoff_delay(attempt);
                debug_println!(
                    "Retrying {} (attempt {}/{}) after {:?}",
                    url,
                    attempt,
                    self.max_attempts,
                    delay
                );
                thread::sleep(delay);
            }

            let request = self
                .client
                .get(url)
                .header("User-Agent", USER_AGENT)
                .header("Accept", ACCEPT)
                .query(params);

            let response = match request.send() {
                Ok(response) => response,
                Err(e) => {
                    last_detail = e.to_string();
                    continue;
                }
            };

            let status = response.status();
            let body = match response.text() {
                Ok(body) => body,
                Err(e) => {
                    last_detail = e.to_string();
                    continue;
                }
            };

            if is_challenge(status, &body) {
                return Err(ListingsError::Challenge {
                    url: url.to_string(),
                });
            }

            if status.is_success() {
                return Ok(body);
            }

            if status.is_server_error() {
                last_detail = format!("HTTP {}", status);
                continue;
            }

            // Client errors won't get better by retrying.
            return Err(ListingsError::Fetch {
                url: url.to_string(),
                detail: format!("HTTP {}", status),
            });
        }

        Err(ListingsError::Fetch {
            url: url.to_string(),
            detail: last_detail,
        })
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = 500 * u64::from(attempt);
    let jitter = rand::thread_rng().gen_range(0..250);
    Duration::from_millis(base + jitter)
}

fn is_challenge(status: StatusCode, body: &str) -> bool {
    if status != StatusCode::FORBIDDEN && status != StatusCode::SERVICE_UNAVAILABLE {
        return false;
    }
    body.contains("cf-chl") || body.contains("challenge-platform") || body.contains("Just a moment")
}

/// Resolve a possibly relative path against the portal base URL.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
