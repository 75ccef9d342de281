//! Device-state subscription
//!
//! A per-topic latest-value cache backed by a tokio `watch` channel. The
//! acquisition thread reads it without blocking; updates arrive from a UDP
//! listener (or any other producer holding a `DeviceStateFeed`). Freshness is
//! tracked per topic, so an update on one topic never consumes another's.

use std::collections::HashMap;
use std::net::SocketAddr;

use contracts::{DeviceState, StateSubscriber};
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;

/// Wire form of a state update: `{"topic":"deviceState","started":true}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    pub topic: String,
    pub started: bool,
}

impl StateMessage {
    pub fn state(&self) -> DeviceState {
        DeviceState {
            started: self.started,
        }
    }
}

/// Latest value per topic, stamped with a per-topic sequence number
#[derive(Debug, Clone, Copy)]
struct Stamped {
    state: DeviceState,
    seq: u64,
}

type StateTable = HashMap<String, Stamped>;

/// Producer side
#[derive(Debug, Clone)]
pub struct DeviceStateFeed {
    tx: watch::Sender<StateTable>,
}

impl DeviceStateFeed {
    /// Replace the latest value for `topic`; other topics are untouched
    pub fn publish(&self, topic: &str, state: DeviceState) {
        self.tx.send_modify(|table| {
            let seq = table.get(topic).map_or(1, |entry| entry.seq + 1);
            table.insert(topic.to_string(), Stamped { state, seq });
        });
    }
}

/// Consumer side; each topic's fresh value is reported once, then `None`
/// until that topic is updated again
#[derive(Debug)]
pub struct DeviceStateCache {
    rx: watch::Receiver<StateTable>,
    topics: Vec<String>,
    seen: HashMap<String, u64>,
}

/// Linked feed and cache; every topic starts out "not started"
pub fn device_state_channel() -> (DeviceStateFeed, DeviceStateCache) {
    let (tx, rx) = watch::channel(StateTable::new());
    (
        DeviceStateFeed { tx },
        DeviceStateCache {
            rx,
            topics: Vec::new(),
            seen: HashMap::new(),
        },
    )
}

impl DeviceStateCache {
    pub fn topics(&self) -> &[String] {
        &self.topics
    }
}

impl StateSubscriber for DeviceStateCache {
    fn subscribe(&mut self, topic: &str) {
        debug!(topic, "subscribed to device state");
        self.topics.push(topic.to_string());
    }

    fn read_latest(&mut self, topic: &str) -> Option<DeviceState> {
        let latest = self.rx.borrow().get(topic).copied()?;
        let seen = self.seen.entry(topic.to_string()).or_default();
        if latest.seq <= *seen {
            return None;
        }
        *seen = latest.seq;
        Some(latest.state)
    }
}

/// UDP listener feeding a `DeviceStateFeed`
pub struct StateListener {
    socket: UdpSocket,
    feed: DeviceStateFeed,
}

impl StateListener {
    #[instrument(name = "state_listener_bind", skip(feed))]
    pub async fn bind(addr: &str, feed: DeviceStateFeed) -> Result<Self, DispatcherError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| DispatcherError::StateBind {
                addr: addr.to_string(),
                source,
            })?;
        info!(addr = %socket.local_addr()?, "device state listener bound");
        Ok(Self { socket, feed })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive updates until the task is aborted
    pub async fn run(self) {
        let mut buf = vec![0u8; 2048];
        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    warn!(error = %e, "state listener receive failed");
                    continue;
                }
            };

            match serde_json::from_slice::<StateMessage>(&buf[..len]) {
                Ok(message) => {
                    debug!(
                        %peer,
                        topic = %message.topic,
                        started = message.started,
                        "device state update"
                    );
                    self.feed.publish(&message.topic, message.state());
                }
                Err(e) => warn!(%peer, error = %e, "malformed device state message"),
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_initial_value_is_not_fresh() {
        let (_feed, mut cache) = device_state_channel();
        assert_eq!(cache.read_latest("deviceState"), None);
    }

    #[test]
    fn test_update_reported_once() {
        let (feed, mut cache) = device_state_channel();
        cache.subscribe("deviceState");

        feed.publish("deviceState", DeviceState { started: true });
        assert_eq!(
            cache.read_latest("deviceState"),
            Some(DeviceState { started: true })
        );
        assert_eq!(cache.read_latest("deviceState"), None);
        assert_eq!(cache.topics(), ["deviceState".to_string()]);
    }

    #[test]
    fn test_other_topic_ignored() {
        let (feed, mut cache) = device_state_channel();
        feed.publish("carState", DeviceState { started: true });
        assert_eq!(cache.read_latest("deviceState"), None);
    }

    #[test]
    fn test_other_topic_does_not_hide_device_state() {
        let (feed, mut cache) = device_state_channel();
        cache.subscribe("deviceState");

        feed.publish("deviceState", DeviceState { started: true });
        feed.publish("carState", DeviceState { started: false });

        assert_eq!(
            cache.read_latest("deviceState"),
            Some(DeviceState { started: true })
        );
        assert_eq!(cache.read_latest("deviceState"), None);
        assert_eq!(
            cache.read_latest("carState"),
            Some(DeviceState { started: false })
        );
    }

    #[test]
    fn test_repeated_value_is_fresh_again() {
        let (feed, mut cache) = device_state_channel();
        feed.publish("deviceState", DeviceState { started: true });
        assert!(cache.read_latest("deviceState").is_some());

        feed.publish("deviceState", DeviceState { started: true });
        assert_eq!(
            cache.read_latest("deviceState"),
            Some(DeviceState { started: true })
        );
    }

    #[test]
    fn test_dropped_feed_keeps_unread_value() {
        let (feed, mut cache) = device_state_channel();
        feed.publish("deviceState", DeviceState { started: false });
        drop(feed);
        assert_eq!(
            cache.read_latest("deviceState"),
            Some(DeviceState { started: false })
        );
        assert_eq!(cache.read_latest("deviceState"), None);
    }

    #[test]
    fn test_dropped_feed_reads_none() {
        let (feed, mut cache) = device_state_channel();
        drop(feed);
        assert_eq!(cache.read_latest("deviceState"), None);
    }

    #[tokio::test]
    async fn test_listener_parses_datagrams() {
        let (feed, mut cache) = device_state_channel();
        let listener = StateListener::bind("127.0.0.1:0", feed).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = listener.spawn();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(b"garbage", addr).await.unwrap();
        sender
            .send_to(br#"{"topic":"deviceState","started":true}"#, addr)
            .await
            .unwrap();

        let mut state = None;
        for _ in 0..100 {
            state = cache.read_latest("deviceState");
            if state.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        task.abort();
        assert_eq!(state, Some(DeviceState { started: true }));
    }
}
