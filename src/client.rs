use reqwest::{Client, RequestBuilder, Url};
use tracing::{debug, error, info, warn};

use crate::auth::GatewayAuth;
use crate::models::appointment::AppointmentEvent;

/// Receives appointment events once a scheduling decision has been stored.
///
/// Delivery is fire-and-forget: a failing notifier never undoes a booking.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: AppointmentEvent);
}

/// Posts appointment events as signed JSON to a webhook
pub struct NotificationClient {
    client: Client,
    webhook_url: Option<Url>,
    signing_key: Option<String>,
}

impl NotificationClient {
    pub fn new(webhook_url: Option<&str>, signing_key: Option<String>) -> Result<Self, String> {
        let webhook_url = webhook_url
            .map(Url::parse)
            .transpose()
            .map_err(|e| format!("Invalid notification webhook URL: {}", e))?;

        match &webhook_url {
            Some(url) => info!("Appointment notifications will be posted to {}", url),
            None => info!("No notification webhook configured - notifications disabled"),
        }

        Ok(Self {
            client: Client::new(),
            webhook_url,
            signing_key,
        })
    }

    /// Build the POST for one event, signed when a key is configured
    fn build_request(&self, url: &Url, event_kind: &str, body: String) -> RequestBuilder {
        let mut request = self
            .client
            .post(url.clone())
            .header("Content-Type", "application/json")
            .header("X-Event", event_kind);

        if let Some(key) = &self.signing_key {
            let timestamp = GatewayAuth::get_timestamp();
            let nonce = GatewayAuth::generate_nonce();
            let header_string = format!(
                "X-Event={}&X-Nonce={}&X-Timestamp={}",
                event_kind, nonce, timestamp
            );
            let signature =
                GatewayAuth::generate_signature(key, "POST", &header_string, url.path(), &body);

            request = request
                .header("X-Timestamp", timestamp.to_string())
                .header("X-Nonce", nonce)
                .header("X-Signature", signature);
        }

        request.body(body)
    }
}

impl Notifier for NotificationClient {
    fn notify(&self, event: AppointmentEvent) {
        let Some(url) = &self.webhook_url else {
            debug!(
                "Skipping {:?} notification for appointment {}",
                event.kind, event.appointment.id
            );
            return;
        };

        let body = match serde_json::to_string(&event) {
            Ok(body) => body,
            Err(err) => {
                error!("Failed to serialize appointment event: {}", err);
                return;
            }
        };

        let event_kind = serde_json::to_value(event.kind)
            .ok()
            .and_then(|value| value.as_str().map(String::from))
            .unwrap_or_default();
        let request = self.build_request(url, &event_kind, body);
        let appointment_id = event.appointment.id;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                "No async runtime available, dropping notification for appointment {}",
                appointment_id
            );
            return;
        };

        runtime.spawn(async move {
            match request.send().await {
                Ok(res) if res.status().is_success() => {
                    info!(
                        "Delivered {} notification for appointment {}",
                        event_kind, appointment_id
                    );
                }
                Ok(res) => {
                    warn!(
                        "Notification for appointment {} rejected with status {}",
                        appointment_id,
                        res.status()
                    );
                }
                Err(err) => {
                    warn!(
                        "Failed to deliver notification for appointment {}: {}",
                        appointment_id, err
                    );
                }
            }
        });
    }
}
