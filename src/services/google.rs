use crate::config::{CacheSettings, GoogleSettings};
use crate::core::{BusyInterval, TimeInstant};
use crate::models::CreatedEvent;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

const CALENDAR_SCOPES: &str =
    "https://www.googleapis.com/auth/calendar.readonly https://www.googleapis.com/auth/calendar.events";

/// Tokens are refreshed this long before Google says they expire
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Errors that can occur when talking to Google Calendar
#[derive(Debug, Error)]
pub enum GoogleCalendarError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Failed to sign service account assertion: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Contents of a service account JSON key file
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: Option<String>,
}

/// How the client obtains access tokens
#[derive(Debug, Clone)]
pub enum GoogleCredentials {
    /// Pre-issued token, used as-is
    AccessToken(String),
    /// Installed-app OAuth grant
    RefreshToken {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
    /// JWT bearer grant signed with a service account key
    ServiceAccount {
        key: ServiceAccountKey,
        subject: Option<String>,
    },
}

impl GoogleCredentials {
    /// Pick the strongest credential available in the settings.
    ///
    /// Returns `Ok(None)` when nothing is configured; a configured but
    /// unreadable service account key is an error.
    pub fn from_settings(settings: &GoogleSettings) -> Result<Option<Self>, GoogleCalendarError> {
        if let Some(path) = non_empty(&settings.service_account_file) {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                GoogleCalendarError::InvalidCredentials(format!("cannot read {}: {}", path, e))
            })?;
            let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
                GoogleCalendarError::InvalidCredentials(format!("malformed key file {}: {}", path, e))
            })?;
            return Ok(Some(GoogleCredentials::ServiceAccount {
                key,
                subject: non_empty(&settings.delegated_subject).map(str::to_string),
            }));
        }

        if let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
            non_empty(&settings.client_id),
            non_empty(&settings.client_secret),
            non_empty(&settings.refresh_token),
        ) {
            return Ok(Some(GoogleCredentials::RefreshToken {
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                refresh_token: refresh_token.to_string(),
            }));
        }

        Ok(non_empty(&settings.access_token).map(|t| GoogleCredentials::AccessToken(t.to_string())))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GoogleCredentials::AccessToken(_) => "access_token",
            GoogleCredentials::RefreshToken { .. } => "refresh_token",
            GoogleCredentials::ServiceAccount { .. } => "service_account",
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) > now,
            None => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest<'a> {
    time_min: String,
    time_max: String,
    items: Vec<CalendarRef<'a>>,
}

#[derive(Debug, Serialize)]
struct CalendarRef<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<RawBusy>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawBusy {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertedEvent {
    id: Option<String>,
    html_link: Option<String>,
}

/// Event to put on the interviewer's calendar
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub summary: String,
    pub description: String,
    pub start: TimeInstant,
    pub duration_minutes: u32,
    pub attendee_emails: Vec<String>,
}

/// Google Calendar API client
///
/// Handles all communication with Google including:
/// - Obtaining and caching access tokens
/// - Querying free/busy information
/// - Creating interview events
pub struct GoogleCalendarClient {
    api_base: String,
    token_url: String,
    calendar_id: String,
    credentials: GoogleCredentials,
    client: Client,
    token: tokio::sync::Mutex<Option<CachedToken>>,
    busy_cache: moka::future::Cache<String, Arc<Vec<BusyInterval>>>,
}

impl GoogleCalendarClient {
    /// Create a new Google Calendar client
    pub fn new(
        settings: &GoogleSettings,
        cache: &CacheSettings,
        credentials: GoogleCredentials,
    ) -> Result<Self, GoogleCalendarError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        let busy_cache = moka::future::CacheBuilder::new(cache.capacity)
            .time_to_live(std::time::Duration::from_secs(cache.ttl_secs))
            .build();

        Ok(Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            token_url: settings.token_url.clone(),
            calendar_id: settings.calendar_id.clone(),
            credentials,
            client,
            token: tokio::sync::Mutex::new(None),
            busy_cache,
        })
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// A 401/403 drops the cached token so the next call re-authenticates
    async fn check_authorized(&self, status: StatusCode, operation: &str) -> Result<(), GoogleCalendarError> {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            *self.token.lock().await = None;
            return Err(GoogleCalendarError::Unauthorized(format!("{} returned {}", operation, status)));
        }
        Ok(())
    }

    /// Current access token, fetching a new one when the cached one is stale
    async fn access_token(&self) -> Result<String, GoogleCalendarError> {
        let mut guard = self.token.lock().await;
        let now = Utc::now();

        if let Some(cached) = guard.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(cached.value.clone());
        }

        let fresh = self.fetch_token(now).await?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self, now: DateTime<Utc>) -> Result<CachedToken, GoogleCalendarError> {
        let (token_url, form): (&str, Vec<(&str, String)>) = match &self.credentials {
            GoogleCredentials::AccessToken(token) => {
                return Ok(CachedToken { value: token.clone(), expires_at: None });
            }
            GoogleCredentials::RefreshToken { client_id, client_secret, refresh_token } => (
                self.token_url.as_str(),
                vec![
                    ("client_id", client_id.clone()),
                    ("client_secret", client_secret.clone()),
                    ("refresh_token", refresh_token.clone()),
                    ("grant_type", "refresh_token".to_string()),
                ],
            ),
            GoogleCredentials::ServiceAccount { key, subject } => {
                let audience = key.token_uri.as_deref().unwrap_or(&self.token_url);
                let claims = JwtClaims {
                    iss: &key.client_email,
                    scope: CALENDAR_SCOPES,
                    aud: audience,
                    iat: now.timestamp(),
                    exp: (now + Duration::hours(1)).timestamp(),
                    sub: subject.as_deref(),
                };
                let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
                let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?;
                (
                    audience,
                    vec![
                        ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer".to_string()),
                        ("assertion", assertion),
                    ],
                )
            }
        };

        tracing::debug!("Requesting Google access token ({})", self.credentials.kind());

        let response = self.client.post(token_url).form(&form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(GoogleCalendarError::Unauthorized(format!(
                "token request failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GoogleCalendarError::InvalidResponse(format!("Failed to parse token response: {}", e)))?;

        Ok(CachedToken {
            value: token.access_token,
            expires_at: token.expires_in.map(|secs| now + Duration::seconds(secs)),
        })
    }

    /// Busy periods on the configured calendar between `now` and `days_ahead` days later
    pub async fn busy_intervals(
        &self,
        now: DateTime<Utc>,
        days_ahead: u32,
    ) -> Result<Arc<Vec<BusyInterval>>, GoogleCalendarError> {
        let cache_key = format!("freebusy:{}:{}", self.calendar_id, days_ahead);

        if let Some(cached) = self.busy_cache.get(&cache_key).await {
            tracing::trace!("Free/busy cache hit: {}", cache_key);
            return Ok(cached);
        }

        let time_max = now
            .checked_add_signed(Duration::days(days_ahead as i64))
            .ok_or(GoogleCalendarError::InvalidRequest(format!("lookahead of {} days is out of range", days_ahead)))?;

        let token = self.access_token().await?;
        let body = FreeBusyRequest {
            time_min: TimeInstant::from_utc(now).to_string(),
            time_max: TimeInstant::from_utc(time_max).to_string(),
            items: vec![CalendarRef { id: &self.calendar_id }],
        };

        let url = format!("{}/freeBusy", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        self.check_authorized(status, "freeBusy").await?;
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GoogleCalendarError::ApiError(format!("freeBusy failed ({}): {}", status, text)));
        }

        let parsed: FreeBusyResponse = response
            .json()
            .await
            .map_err(|e| GoogleCalendarError::InvalidResponse(format!("Failed to parse freeBusy: {}", e)))?;

        let calendar = parsed.calendars.get(&self.calendar_id).ok_or_else(|| {
            GoogleCalendarError::InvalidResponse(format!("Calendar {} missing from response", self.calendar_id))
        })?;

        if !calendar.errors.is_empty() {
            return Err(GoogleCalendarError::ApiError(format!(
                "Calendar {} reported errors: {:?}",
                self.calendar_id, calendar.errors
            )));
        }

        let intervals: Vec<BusyInterval> = calendar
            .busy
            .iter()
            .filter_map(|raw| match (TimeInstant::parse(&raw.start), TimeInstant::parse(&raw.end)) {
                (Ok(start), Ok(end)) => Some(BusyInterval { start, end }),
                _ => {
                    tracing::warn!("Skipping unparseable busy period {} - {}", raw.start, raw.end);
                    None
                }
            })
            .collect();

        tracing::info!("Found {} busy periods in next {} days", intervals.len(), days_ahead);

        let intervals = Arc::new(intervals);
        self.busy_cache.insert(cache_key, intervals.clone()).await;
        Ok(intervals)
    }

    /// Create an event and invite the attendees
    pub async fn create_event(&self, event: &NewEvent) -> Result<CreatedEvent, GoogleCalendarError> {
        let token = self.access_token().await?;
        let end = event.start.plus(Duration::minutes(event.duration_minutes as i64));

        let payload = serde_json::json!({
            "summary": event.summary,
            "description": event.description,
            "start": { "dateTime": event.start.to_string(), "timeZone": "UTC" },
            "end": { "dateTime": end.to_string(), "timeZone": "UTC" },
            "attendees": event
                .attendee_emails
                .iter()
                .map(|email| serde_json::json!({ "email": email }))
                .collect::<Vec<_>>(),
        });

        let url = format!(
            "{}/calendars/{}/events?sendUpdates=all",
            self.api_base,
            urlencoding::encode(&self.calendar_id)
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        self.check_authorized(status, "events.insert").await?;
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GoogleCalendarError::ApiError(format!(
                "Failed to create event ({}): {}",
                status, text
            )));
        }

        let inserted: InsertedEvent = response
            .json()
            .await
            .map_err(|e| GoogleCalendarError::InvalidResponse(format!("Failed to parse event: {}", e)))?;

        tracing::info!("Created calendar event {:?}", inserted.id);

        // Busy periods changed
        self.busy_cache.invalidate_all();

        Ok(CreatedEvent {
            event_id: inserted.id,
            event_link: inserted.html_link,
        })
    }
}
