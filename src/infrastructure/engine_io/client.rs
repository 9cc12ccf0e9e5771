use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::framing::{decode_packets, CONNECT, EVENT, OPEN, PING, PONG};
use crate::shared::errors::StreamError;

/// Handshake settings
#[derive(Debug, Clone)]
pub struct EngineIoConfig {
    pub base_url: String,
    pub path: String,
    pub event_name: String,
    /// Event emitted right after the session is confirmed, if any
    pub request_event: Option<String>,
    pub max_polls: u32,
    pub poll_delay: Duration,
    pub request_timeout: Duration,
}

impl EngineIoConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: "/socket.io/".to_string(),
            event_name: "update_all".to_string(),
            request_event: Some("request_initial_data".to_string()),
            max_polls: 5,
            poll_delay: Duration::from_millis(200),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Ceiling for the whole exchange: open, confirm, request and every poll
    pub fn overall_timeout(&self) -> Duration {
        self.request_timeout * (3 + self.max_polls) + self.poll_delay * self.max_polls
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }
}

/// Body of the open packet
#[derive(Debug, Deserialize)]
struct OpenPacket {
    sid: Option<String>,
}

/// Short-lived polling client that fetches a single pushed event
pub struct EngineIoClient {
    http_client: Client,
    config: EngineIoConfig,
}

impl EngineIoClient {
    pub fn new(config: EngineIoConfig) -> Result<Self, StreamError> {
        let http_client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { http_client, config })
    }

    pub fn config(&self) -> &EngineIoConfig {
        &self.config
    }

    /// Payload of the configured event, or `None` on any failure
    pub async fn fetch_event(&self) -> Option<Value> {
        let limit = self.config.overall_timeout();
        match tokio::time::timeout(limit, self.try_fetch_event()).await {
            Ok(Ok(payload)) => Some(payload),
            Ok(Err(e)) => {
                warn!("⚠️ Stream handshake gave no payload: {}", e);
                None
            }
            Err(_) => {
                warn!("⚠️ Stream handshake timed out after {:?}", limit);
                None
            }
        }
    }

    pub async fn try_fetch_event(&self) -> Result<Value, StreamError> {
        info!("📡 Opening polling session at {}", self.config.endpoint());
        let sid = self.open().await?;
        debug!("Session id: {}", sid);

        self.send(&sid, CONNECT).await?;

        if let Some(request) = &self.config.request_event {
            let packet = format!("{}{}", EVENT, serde_json::to_string(&[request])?);
            if let Err(e) = self.send(&sid, &packet).await {
                warn!("⚠️ Failed to emit '{}': {}", request, e);
            }
        }

        let max_polls = self.config.max_polls;
        for attempt in 1..=max_polls {
            let packets = self.poll(&sid).await?;
            debug!("Poll {}/{} returned {} packets", attempt, max_polls, packets.len());

            if let Some(payload) = find_event(&packets, &self.config.event_name) {
                info!("✅ Received '{}' on poll {}", self.config.event_name, attempt);
                return Ok(payload);
            }

            if packets.iter().any(|p| p == PING) {
                if let Err(e) = self.send(&sid, PONG).await {
                    warn!("⚠️ Pong failed: {}", e);
                }
            }

            if attempt < max_polls {
                tokio::time::sleep(self.config.poll_delay).await;
            }
        }

        Err(StreamError::EventNotFound {
            event: self.config.event_name.clone(),
            attempts: max_polls,
        })
    }

    async fn open(&self) -> Result<String, StreamError> {
        let response = self
            .http_client
            .get(self.config.endpoint())
            .query(&transport_query(None))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StreamError::Status(response.status()));
        }

        let body = response.text().await?;
        let first = decode_packets(&body).into_iter().next().ok_or(StreamError::EmptyResponse)?;
        parse_session_id(&first)
    }

    async fn send(&self, sid: &str, packet: &str) -> Result<(), StreamError> {
        let response = self
            .http_client
            .post(self.config.endpoint())
            .query(&transport_query(Some(sid)))
            .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(packet.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StreamError::Status(response.status()));
        }
        Ok(())
    }

    async fn poll(&self, sid: &str) -> Result<Vec<String>, StreamError> {
        let response = self
            .http_client
            .get(self.config.endpoint())
            .query(&transport_query(Some(sid)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StreamError::Status(response.status()));
        }

        let body = response.text().await?;
        Ok(decode_packets(&body))
    }
}

fn transport_query(sid: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("EIO", "4".to_string()),
        ("transport", "polling".to_string()),
        ("t", chrono::Utc::now().timestamp_millis().to_string()),
    ];
    if let Some(sid) = sid {
        query.push(("sid", sid.to_string()));
    }
    query
}

/// Session id from the first packet of the open response
pub fn parse_session_id(packet: &str) -> Result<String, StreamError> {
    let json = packet.strip_prefix(OPEN).unwrap_or(packet);
    let open: OpenPacket = serde_json::from_str(json)?;
    open.sid.filter(|s| !s.is_empty()).ok_or(StreamError::MissingSession)
}

/// Payload of the first `42["event", payload]` packet naming `event`
pub fn find_event(packets: &[String], event: &str) -> Option<Value> {
    packets.iter().find_map(|packet| {
        let body = packet.strip_prefix(EVENT)?;
        let mut parts = match serde_json::from_str::<Value>(body).ok()? {
            Value::Array(parts) => parts.into_iter(),
            _ => return None,
        };
        let name = parts.next()?;
        if name.as_str() != Some(event) {
            return None;
        }
        Some(parts.next().unwrap_or(Value::Null))
    })
}
