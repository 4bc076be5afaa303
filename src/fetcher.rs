// 🌐 Fetcher - resolve feed URLs and download raw bytes
//
// The PIX list lives under a URL carrying its publication date, which is
// not announced anywhere. We probe recent dates (business days first) and
// take the first one the server actually has. The STR list has a fixed URL.

use crate::config::{PipelineConfig, DATE_PLACEHOLDER};
use crate::error::SourceError;
use crate::parser::SourceType;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration as Days, FixedOffset, NaiveDate, Utc, Weekday};
use std::cmp::Reverse;
use std::time::Duration;
use tracing::{debug, info, warn};

// ============================================================================
// HTTP PORT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum HttpFailure {
    /// Server answered with a non-success status
    Status(u16),
    /// Connection, timeout or body read failure
    Transport(String),
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET `url`, returning the body of a 2xx response
    async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, HttpFailure>;
}

/// reqwest-backed client used in production
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ReqwestClient { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, HttpFailure> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| HttpFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpFailure::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpFailure::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// ============================================================================
// SOURCE DESCRIPTORS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Fixed { url: String },
    Dated { template: String, days_back: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    pub source_type: SourceType,
    pub kind: SourceKind,
    pub timeout: Duration,
}

impl SourceDescriptor {
    pub fn pix(config: &PipelineConfig) -> Self {
        SourceDescriptor {
            source_type: SourceType::PixParticipants,
            kind: SourceKind::Dated {
                template: config.pix.url_template.clone(),
                days_back: config.pix.days_back,
            },
            timeout: config.http.timeout(),
        }
    }

    pub fn str_participants(config: &PipelineConfig) -> Self {
        SourceDescriptor {
            source_type: SourceType::StrParticipants,
            kind: SourceKind::Fixed {
                url: config.str_source.url.clone(),
            },
            timeout: config.http.timeout(),
        }
    }

    /// Every URL that will be tried, in order, with its publication date
    pub fn candidate_urls(&self, today: NaiveDate) -> Vec<(String, Option<NaiveDate>)> {
        match &self.kind {
            SourceKind::Fixed { url } => vec![(url.clone(), None)],
            SourceKind::Dated {
                template,
                days_back,
            } => candidate_dates(today, *days_back)
                .into_iter()
                .map(|date| (dated_url(template, date), Some(date)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPayload {
    pub source_type: SourceType,
    pub url: String,
    pub bytes: Vec<u8>,
    /// Date embedded in the URL, for dated feeds
    pub published_on: Option<NaiveDate>,
    pub attempts: usize,
}

// ============================================================================
// DATE PROBING
// ============================================================================

/// Brasília has been UTC-3 all year since daylight saving ended in 2019
pub const PUBLISHER_UTC_OFFSET_SECS: i32 = -3 * 3600;

/// Calendar date at the publisher, which is what the dated URLs carry
pub fn publisher_today(now: DateTime<Utc>) -> NaiveDate {
    FixedOffset::east_opt(PUBLISHER_UTC_OFFSET_SECS)
        .map(|offset| now.with_timezone(&offset).date_naive())
        .unwrap_or_else(|| now.date_naive())
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `days_back` dates ending at `today`: weekdays first, newest first in each group
pub fn candidate_dates(today: NaiveDate, days_back: usize) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = (0..days_back as i64)
        .map(|offset| today - Days::days(offset))
        .collect();

    dates.sort_by_key(|date| (is_weekend(*date), Reverse(*date)));
    dates
}

pub fn dated_url(template: &str, date: NaiveDate) -> String {
    template.replace(DATE_PLACEHOLDER, &date.format("%Y%m%d").to_string())
}

// ============================================================================
// FETCH
// ============================================================================

/// Try each candidate URL in order and return the first successful body.
pub async fn fetch(
    client: &dyn HttpClient,
    descriptor: &SourceDescriptor,
    today: NaiveDate,
) -> Result<FetchedPayload, SourceError> {
    let source_type = descriptor.source_type;
    let candidates = descriptor.candidate_urls(today);
    let mut last_failure = None;

    for (attempt, (url, published_on)) in candidates.iter().enumerate() {
        debug!(source = %source_type, url = %url, "requesting");

        match client.get(url, descriptor.timeout).await {
            Ok(bytes) => {
                info!(
                    source = %source_type,
                    url = %url,
                    bytes = bytes.len(),
                    attempts = attempt + 1,
                    "downloaded feed"
                );
                return Ok(FetchedPayload {
                    source_type,
                    url: url.clone(),
                    bytes,
                    published_on: *published_on,
                    attempts: attempt + 1,
                });
            }
            Err(failure) => {
                debug!(source = %source_type, url = %url, failure = ?failure, "candidate failed");
                last_failure = Some((url.clone(), failure));
            }
        }
    }

    warn!(source = %source_type, attempts = candidates.len(), "feed unavailable");

    // A single fixed URL reports the concrete HTTP failure
    match (&descriptor.kind, last_failure) {
        (SourceKind::Fixed { .. }, Some((url, HttpFailure::Status(status)))) => Err(SourceError::Status {
            source_type,
            url,
            status,
        }),
        (SourceKind::Fixed { .. }, Some((url, HttpFailure::Transport(message)))) => Err(SourceError::Http {
            source_type,
            url,
            message,
        }),
        _ => Err(SourceError::Unavailable {
            source_type,
            attempts: candidates.len(),
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================
