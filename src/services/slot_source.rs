use crate::config::Settings;
use crate::core::{generate_slots, parse_instants, SlotWindow, TimeInstant, WindowError, MAX_SLOTS};
use crate::services::google::{GoogleCalendarClient, GoogleCalendarError, GoogleCredentials};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Interviewer slots served when nothing better is available
pub const BASIC_FIXTURE: &[&str] = &[
    "2025-07-15T14:00:00Z",
    "2025-07-15T21:00:00Z",
    "2025-07-16T10:00:00Z",
    "2025-07-16T21:00:00Z",
    "2025-07-17T09:00:00Z",
    "2025-07-17T14:00:00Z",
    "2025-07-18T15:00:00Z",
    "2025-07-18T20:00:00Z",
];

/// Errors that can occur while listing interviewer availability
#[derive(Debug, Error)]
pub enum SlotSourceError {
    #[error("Calendar unavailable: {0}")]
    UpstreamUnavailable(#[from] GoogleCalendarError),

    #[error("Invalid slot window: {0}")]
    InvalidWindow(#[from] WindowError),

    #[error("{source_name} did not answer within {timeout:?}")]
    Timeout {
        source_name: &'static str,
        timeout: Duration,
    },
}

/// Supplier of interviewer-available instants, in preference order
#[async_trait]
pub trait SlotSource: Send + Sync {
    /// Short identifier of the configured source (the head of a chain)
    fn name(&self) -> &'static str;

    /// Source that served the most recent lookup
    fn active_name(&self) -> &'static str {
        self.name()
    }

    async fn list_available_slots(&self, window: &SlotWindow) -> Result<Vec<TimeInstant>, SlotSourceError>;
}

/// Free slots from the interviewer's Google Calendar
pub struct LiveSlotSource {
    client: Arc<GoogleCalendarClient>,
}

impl LiveSlotSource {
    pub fn new(client: Arc<GoogleCalendarClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SlotSource for LiveSlotSource {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn list_available_slots(&self, window: &SlotWindow) -> Result<Vec<TimeInstant>, SlotSourceError> {
        window.validate()?;
        let now = Utc::now();
        let busy = self.client.busy_intervals(now, window.days_ahead).await?;
        Ok(generate_slots(now, window, &busy))
    }
}

/// Business-hour sweep with no busy periods
#[derive(Debug, Clone, Default)]
pub struct SyntheticSmartSource {
    anchor: Option<DateTime<Utc>>,
}

impl SyntheticSmartSource {
    pub fn new() -> Self {
        Self { anchor: None }
    }

    /// Sweep from a fixed instant instead of the wall clock
    pub fn anchored_at(anchor: DateTime<Utc>) -> Self {
        Self { anchor: Some(anchor) }
    }
}

#[async_trait]
impl SlotSource for SyntheticSmartSource {
    fn name(&self) -> &'static str {
        "synthetic_smart"
    }

    async fn list_available_slots(&self, window: &SlotWindow) -> Result<Vec<TimeInstant>, SlotSourceError> {
        window.validate()?;
        let now = self.anchor.unwrap_or_else(Utc::now);
        Ok(generate_slots(now, window, &[]))
    }
}

/// Fixed list of slots, served regardless of the window
#[derive(Debug, Clone)]
pub struct SyntheticBasicSource {
    slots: Vec<TimeInstant>,
}

impl SyntheticBasicSource {
    pub fn new(mut slots: Vec<TimeInstant>) -> Self {
        slots.truncate(MAX_SLOTS);
        Self { slots }
    }

    /// Configured fixture, or the built-in one when none (or none valid) is given
    pub fn from_fixture(fixture: &[String]) -> Self {
        let slots = parse_instants(fixture);
        if slots.is_empty() {
            Self::default()
        } else {
            Self::new(slots)
        }
    }

    pub fn slots(&self) -> &[TimeInstant] {
        &self.slots
    }
}

impl Default for SyntheticBasicSource {
    fn default() -> Self {
        Self::new(parse_instants(BASIC_FIXTURE))
    }
}

#[async_trait]
impl SlotSource for SyntheticBasicSource {
    fn name(&self) -> &'static str {
        "synthetic_basic"
    }

    async fn list_available_slots(&self, _window: &SlotWindow) -> Result<Vec<TimeInstant>, SlotSourceError> {
        Ok(self.slots.clone())
    }
}

/// Try `primary` within a time budget and degrade to `secondary` on any failure
pub struct FallbackSlotSource {
    primary: Arc<dyn SlotSource>,
    secondary: Arc<dyn SlotSource>,
    timeout: Duration,
    degraded: AtomicBool,
}

impl FallbackSlotSource {
    pub fn new(primary: Arc<dyn SlotSource>, secondary: Arc<dyn SlotSource>, timeout: Duration) -> Self {
        Self {
            primary,
            secondary,
            timeout,
            degraded: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl SlotSource for FallbackSlotSource {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn active_name(&self) -> &'static str {
        if self.degraded.load(Ordering::Relaxed) {
            self.secondary.active_name()
        } else {
            self.primary.active_name()
        }
    }

    async fn list_available_slots(&self, window: &SlotWindow) -> Result<Vec<TimeInstant>, SlotSourceError> {
        let attempt = tokio::time::timeout(self.timeout, self.primary.list_available_slots(window))
            .await
            .unwrap_or_else(|_| {
                Err(SlotSourceError::Timeout {
                    source_name: self.primary.name(),
                    timeout: self.timeout,
                })
            });

        self.degraded.store(attempt.is_err(), Ordering::Relaxed);

        match attempt {
            Ok(slots) => Ok(slots),
            Err(e) => {
                tracing::warn!(
                    "Slot source {} failed ({}), falling back to {}",
                    self.primary.name(),
                    e,
                    self.secondary.name()
                );
                self.secondary.list_available_slots(window).await
            }
        }
    }
}

/// Build the slot source chain from whatever credentials are configured.
///
/// With Google credentials: live → synthetic sweep → fixed fixture.
/// Without: synthetic sweep → fixed fixture. Also returns the Google client,
/// when one could be built, for event creation.
pub fn resolve_slot_source(settings: &Settings) -> (Arc<dyn SlotSource>, Option<Arc<GoogleCalendarClient>>) {
    let lookup_timeout = Duration::from_secs(settings.google.lookup_timeout_secs);
    let synthetic: Arc<dyn SlotSource> = Arc::new(FallbackSlotSource::new(
        Arc::new(SyntheticSmartSource::new()),
        Arc::new(SyntheticBasicSource::from_fixture(&settings.slots.basic_fixture)),
        lookup_timeout,
    ));

    let credentials = match GoogleCredentials::from_settings(&settings.google) {
        Ok(Some(credentials)) => credentials,
        Ok(None) => {
            tracing::info!("No Google credentials configured, using synthetic availability");
            return (synthetic, None);
        }
        Err(e) => {
            tracing::error!("Google credentials unusable ({}), using synthetic availability", e);
            return (synthetic, None);
        }
    };

    let kind = credentials.kind();
    match GoogleCalendarClient::new(&settings.google, &settings.cache, credentials) {
        Ok(client) => {
            tracing::info!("Google Calendar client initialized ({} credentials)", kind);
            let client = Arc::new(client);
            let live: Arc<dyn SlotSource> = Arc::new(LiveSlotSource::new(client.clone()));
            let chain = Arc::new(FallbackSlotSource::new(live, synthetic, lookup_timeout));
            (chain, Some(client))
        }
        Err(e) => {
            tracing::error!("Failed to build Google Calendar client ({}), using synthetic availability", e);
            (synthetic, None)
        }
    }
}
