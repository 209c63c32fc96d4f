//! Outbound customer notification over a WhatsApp HTTP gateway.
//! Best-effort: callers log failures and never roll back a committed
//! booking because of one.

use std::env;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Serialize;

const RETRIES: u32 = 1;
const WHATSAPP_SERVICE_HOST_ENV: &str = "WHATSAPP_SERVICE_HOST";

#[derive(Clone, Debug, Serialize)]
struct SendMessageRequest<'a> {
    phone: &'a str,
    message: &'a str,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, phone: &str, text: &str) -> Result<()>;
}

pub struct WhatsappNotifier;

#[async_trait]
impl Notifier for WhatsappNotifier {
    async fn send(&self, phone: &str, text: &str) -> Result<()> {
        let Ok(service_host) = env::var(WHATSAPP_SERVICE_HOST_ENV) else {
            log::warn!("{} not set, skipping WhatsApp delivery", WHATSAPP_SERVICE_HOST_ENV);
            return Ok(());
        };

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(RETRIES);

        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let response = client
            .post(format!("{}/send", service_host))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(&SendMessageRequest { phone, message: text })?)
            .send()
            .await?;

        response.error_for_status()?;

        Ok(())
    }
}

/// Test double that records what would have been delivered.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, phone: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push((phone.to_string(), text.to_string()));
        Ok(())
    }
}
