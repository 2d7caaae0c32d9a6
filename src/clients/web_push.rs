use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::db::repositories::push::PushSubscription;
use crate::services::push::{PushPayload, PushSender, SendOutcome};

#[derive(Serialize)]
struct RelayKeys<'a> {
    p256dh: &'a str,
    auth: &'a str,
}

#[derive(Serialize)]
struct RelaySubscription<'a> {
    endpoint: &'a str,
    keys: RelayKeys<'a>,
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    subscription: RelaySubscription<'a>,
    payload: &'a PushPayload,
    ttl: u32,
}

/// Posts payloads to push endpoints, or to a relay that performs the
/// web-push encryption when one is configured.
pub struct HttpPushSender {
    client: Client,
    relay_url: Option<String>,
    ttl_seconds: u32,
}

impl HttpPushSender {
    #[must_use]
    pub const fn new(client: Client, relay_url: Option<String>, ttl_seconds: u32) -> Self {
        Self {
            client,
            relay_url,
            ttl_seconds,
        }
    }

    fn request(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> reqwest::RequestBuilder {
        let ttl = self.ttl_seconds.to_string();
        match &self.relay_url {
            Some(relay) => self.client.post(relay).header("TTL", ttl).json(&RelayRequest {
                subscription: RelaySubscription {
                    endpoint: &subscription.endpoint,
                    keys: RelayKeys {
                        p256dh: &subscription.p256dh,
                        auth: &subscription.auth,
                    },
                },
                payload,
                ttl: self.ttl_seconds,
            }),
            None => self
                .client
                .post(&subscription.endpoint)
                .header("TTL", ttl)
                .json(payload),
        }
    }
}

/// 404 and 410 mean the browser dropped the subscription.
#[must_use]
pub fn classify_status(status: StatusCode) -> SendOutcome {
    if status.is_success() {
        SendOutcome::Delivered
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        SendOutcome::Gone
    } else {
        SendOutcome::Failed(format!("push service returned {status}"))
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(&self, subscription: &PushSubscription, payload: &PushPayload) -> SendOutcome {
        match self.request(subscription, payload).send().await {
            Ok(response) => classify_status(response.status()),
            Err(e) => SendOutcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::CREATED), SendOutcome::Delivered);
        assert_eq!(classify_status(StatusCode::GONE), SendOutcome::Gone);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), SendOutcome::Gone);
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            SendOutcome::Failed(_)
        ));
    }
}
