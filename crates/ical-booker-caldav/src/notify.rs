//! Booking confirmation e-mails through the EmailJS HTTP API.
//!
//! One template is used for both mails; only `to_email`/`to_name` differ.
//! When the booking has an attendee they get a confirmation first. The
//! account owner (`admin_email`) is always notified once.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use ical_booker_core::{Booking, NewEvent};

use crate::error::{CalDavError, CalDavResult};

/// EmailJS send endpoint.
pub const EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Time zone used to render event times when none is configured.
pub const DEFAULT_DISPLAY_TIMEZONE: Tz = chrono_tz::America::Toronto;

/// EmailJS account and sender settings.
#[derive(Clone)]
pub struct EmailConfig {
    /// EmailJS service id.
    pub service_id: String,
    /// EmailJS template id.
    pub template_id: String,
    /// EmailJS public key (`user_id`).
    pub public_key: String,
    /// EmailJS private key (access token).
    pub private_key: String,
    /// Address that receives every booking notification.
    pub admin_email: String,
    /// Sender display name.
    pub from_name: String,
    /// Sender address.
    pub from_email: String,
    /// Value of the `origin` header EmailJS checks against its allow list.
    pub origin: String,
    /// Zone for the human-readable start/end.
    pub display_timezone: Tz,
    /// Send endpoint; overridden in tests.
    pub endpoint: String,
}

impl EmailConfig {
    /// Creates a configuration with the required EmailJS fields.
    pub fn new(
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        admin_email: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            template_id: template_id.into(),
            public_key: public_key.into(),
            private_key: private_key.into(),
            admin_email: admin_email.into(),
            from_name: String::new(),
            from_email: String::new(),
            origin: "*".to_string(),
            display_timezone: DEFAULT_DISPLAY_TIMEZONE,
            endpoint: EMAILJS_ENDPOINT.to_string(),
        }
    }

    /// Builder method to set the sender.
    pub fn with_sender(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.from_name = name.into();
        self.from_email = email.into();
        self
    }

    /// Builder method to set the `origin` header.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Builder method to set the display time zone.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.display_timezone = tz;
        self
    }

    /// Builder method to point at another endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("admin_email", &self.admin_email)
            .field("from_name", &self.from_name)
            .field("from_email", &self.from_email)
            .field("origin", &self.origin)
            .field("display_timezone", &self.display_timezone)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Variables passed to the EmailJS template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParams {
    pub event_title: String,
    pub event_start: String,
    pub event_end: String,
    pub attendee_name: String,
    pub attendee_email: String,
    pub meeting_reason: String,
    pub ics_url: String,
    pub uid: String,
    pub from_name: String,
    pub from_email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub to_email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub to_name: String,
}

impl TemplateParams {
    /// Builds the shared parameters for a booking, without a recipient.
    pub fn new(config: &EmailConfig, event: &NewEvent, booking: &Booking) -> Self {
        let attendee = event.primary_attendee();
        Self {
            event_title: event.title.clone(),
            event_start: format_display_time(event.start, config.display_timezone),
            event_end: format_display_time(event.end, config.display_timezone),
            attendee_name: attendee
                .and_then(|a| a.split('@').next())
                .filter(|name| !name.is_empty())
                .unwrap_or("Guest")
                .to_string(),
            attendee_email: attendee.unwrap_or("N/A").to_string(),
            meeting_reason: event.description.clone().unwrap_or_default(),
            ics_url: booking.url.to_string(),
            uid: booking.uid.clone(),
            from_name: config.from_name.clone(),
            from_email: config.from_email.clone(),
            to_email: String::new(),
            to_name: String::new(),
        }
    }

    /// Returns a copy addressed to one recipient.
    pub fn addressed_to(mut self, email: &str, name: &str) -> Self {
        self.to_email = email.to_string();
        self.to_name = name.to_string();
        self
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken")]
    access_token: &'a str,
    template_params: &'a TemplateParams,
}

/// Renders an instant like `Wednesday, February 5, 2025 at 09:00 AM EST`.
pub fn format_display_time(dt: DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz)
        .format("%A, %B %-d, %Y at %I:%M %p %Z")
        .to_string()
}

/// Sends the booking confirmation mails.
///
/// # Errors
///
/// Returns a `Notification` error (with the HTTP status) if EmailJS
/// rejects a mail, or a `Transport` error if it cannot be reached. A failed
/// guest mail stops before the admin mail is sent.
pub async fn send_booking_emails(
    client: &Client,
    config: &EmailConfig,
    event: &NewEvent,
    booking: &Booking,
) -> CalDavResult<()> {
    let params = TemplateParams::new(config, event, booking);

    if let Some(attendee) = event.primary_attendee() {
        let guest = params.clone().addressed_to(attendee, &params.attendee_name);
        send_email(client, config, &guest).await?;
    }

    let admin = params.addressed_to(&config.admin_email, &config.from_name);
    send_email(client, config, &admin).await?;

    info!(uid = %booking.uid, "Booking notifications sent");
    Ok(())
}

async fn send_email(
    client: &Client,
    config: &EmailConfig,
    params: &TemplateParams,
) -> CalDavResult<()> {
    let payload = SendRequest {
        service_id: &config.service_id,
        template_id: &config.template_id,
        user_id: &config.public_key,
        access_token: &config.private_key,
        template_params: params,
    };

    debug!(to = %params.to_email, "Sending EmailJS message");

    let response = client
        .post(&config.endpoint)
        .header("X-EmailJS-Key", &config.private_key)
        .header("origin", &config.origin)
        .json(&payload)
        .send()
        .await
        .map_err(|e| {
            CalDavError::transport(format!("EmailJS request failed: {}", e)).with_source(e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CalDavError::notification(format!(
            "EmailJS rejected mail to {}: {}",
            params.to_email,
            body.trim()
        ))
        .with_status(status.as_u16()));
    }

    Ok(())
}
