// Google Calendar integration
// The OAuth token swap happens behind an exchange endpoint; this side only
// sends the authorization code and receives raw event records.

use crate::error::{AppResult, PlannerError};
use crate::http_config::HttpConfig;
use crate::models::{ExchangeSettings, RemoteEvent};
use crate::utils::logging;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use url::Url;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Opaque "authorization code in, event list out" collaborator.
pub trait CalendarExchange {
    fn exchange_code_for_events(
        &self,
        code: &str,
    ) -> impl Future<Output = AppResult<Vec<RemoteEvent>>> + Send;
}

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    success: bool,
    #[serde(default)]
    events: Vec<RemoteEvent>,
    #[serde(default)]
    error: Option<String>,
}

/// Talks to the exchange endpoint over HTTPS with a JSON body.
#[derive(Debug, Clone)]
pub struct HttpCalendarExchange {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    redirect_uri: String,
}

impl HttpCalendarExchange {
    pub fn new(endpoint: Url, api_key: Option<String>, redirect_uri: String, timeout: Duration) -> AppResult<Self> {
        let client = HttpConfig::calendar_exchange(timeout).build_client()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            redirect_uri,
        })
    }

    pub fn from_settings(settings: &ExchangeSettings) -> AppResult<Self> {
        let raw = settings.endpoint.as_deref().ok_or_else(|| {
            PlannerError::config("no calendar exchange endpoint configured")
        })?;
        let endpoint = Url::parse(raw)
            .map_err(|e| PlannerError::config(format!("invalid exchange endpoint '{}': {}", raw, e)))?;
        Self::new(
            endpoint,
            settings.api_key.clone(),
            settings.redirect_uri.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

impl CalendarExchange for HttpCalendarExchange {
    async fn exchange_code_for_events(&self, code: &str) -> AppResult<Vec<RemoteEvent>> {
        let started = Instant::now();
        logging::log_auth_event("Exchanging authorization code", self.endpoint.as_str());

        let mut request = self.client.post(self.endpoint.clone()).json(&ExchangeRequest {
            code,
            redirect_uri: &self.redirect_uri,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            logging::log_network_error("calendar exchange", &e);
            PlannerError::remote(format!("request failed: {}", e))
        })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PlannerError::remote(format!("failed to read response body: {}", e)))?;

        let parsed: ExchangeResponse = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                PlannerError::remote(format!("unexpected response: {}", e))
            } else {
                PlannerError::remote(format!("HTTP {}", status))
            }
        })?;

        if !parsed.success {
            return Err(PlannerError::remote(
                parsed
                    .error
                    .unwrap_or_else(|| format!("Failed to fetch calendar events (HTTP {})", status)),
            ));
        }

        log::info!(
            "Calendar exchange returned {} records in {}ms",
            parsed.events.len(),
            started.elapsed().as_millis()
        );
        Ok(parsed.events)
    }
}

/// Runs one exchange, failing with `RemoteFetch` if it does not finish in time.
pub async fn fetch_remote_events<E: CalendarExchange>(
    exchange: &E,
    code: &str,
    timeout: Duration,
) -> AppResult<Vec<RemoteEvent>> {
    if code.trim().is_empty() {
        return Err(PlannerError::invalid_input("authorization code is empty"));
    }
    match tokio::time::timeout(timeout, exchange.exchange_code_for_events(code.trim())).await {
        Ok(result) => result,
        Err(_) => Err(PlannerError::remote(format!(
            "no response within {}s",
            timeout.as_secs_f32()
        ))),
    }
}

/// Consent-screen URL for read-only calendar access.
pub fn build_authorization_url(client_id: &str, redirect_uri: &str) -> AppResult<Url> {
    if client_id.trim().is_empty() {
        return Err(PlannerError::invalid_input("OAuth client id is empty"));
    }
    Url::parse(redirect_uri)
        .map_err(|e| PlannerError::invalid_input(format!("invalid redirect URI: {}", e)))?;

    Url::parse_with_params(
        GOOGLE_AUTH_URL,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", CALENDAR_READONLY_SCOPE),
            ("response_type", "code"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| PlannerError::invalid_input(format!("could not build consent URL: {}", e)))
}
