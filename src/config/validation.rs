//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and the env parser handle syntax)
//! - Require the webhook URL and check it is an http(s) URL
//! - Validate value ranges (window > 0, threshold within 0..=100)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WatcherConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{DeliveryMode, WatcherConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("SLACK_WEBHOOK_URL is required")]
    MissingWebhook,

    #[error("webhook URL {0:?} is not a valid http(s) URL")]
    InvalidWebhook(String),

    #[error("error rate threshold {0} must be within 0..=100")]
    ThresholdOutOfRange(f64),

    #[error("window size must be greater than zero")]
    EmptyWindow,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("alert timeout must be greater than zero")]
    ZeroAlertTimeout,

    #[error("background delivery needs at least one in-flight slot")]
    NoDeliverySlots,
}

/// Check a fully merged configuration.
pub fn validate_config(config: &WatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.alerts.webhook_url.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::MissingWebhook),
        Some(raw) => match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => errors.push(ValidationError::InvalidWebhook(raw.to_string())),
        },
    }

    let threshold = config.detection.error_rate_threshold;
    if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
        errors.push(ValidationError::ThresholdOutOfRange(threshold));
    }

    if config.detection.window_size == 0 {
        errors.push(ValidationError::EmptyWindow);
    }

    if config.source.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    if config.alerts.timeout_secs == 0 {
        errors.push(ValidationError::ZeroAlertTimeout);
    }

    if config.alerts.delivery == DeliveryMode::Background && config.alerts.max_in_flight == 0 {
        errors.push(ValidationError::NoDeliverySlots);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
