#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use relay_engine::{
    Connector, CycleEvent, Destination, FailureKind, GalleryResolver, ListingQuery, MessageId,
    Messenger, PollConfig, Post, ProgressSink, RelayError, Session, Source, SourceCredentials,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(relay_logging::initialize_for_tests);
}

pub fn sample_config() -> PollConfig {
    PollConfig {
        query: ListingQuery {
            path: "/r/pics/".to_string(),
            sort: "top".to_string(),
            period: "day".to_string(),
            limit: 70,
        },
        sleep: Duration::ZERO,
        destination: Destination {
            token: "123:abc".to_string(),
            chat_id: -1001,
        },
        credentials: SourceCredentials {
            client_id: "client".to_string(),
            secret: "secret".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
        },
    }
}

pub fn network_error() -> RelayError {
    RelayError::new(FailureKind::Network, "connection refused")
}

#[derive(Clone, Default)]
pub struct StubSource {
    pub posts: Vec<Post>,
    pub fail: Option<RelayError>,
}

#[async_trait::async_trait]
impl Source for StubSource {
    async fn fetch(&self, _query: &ListingQuery) -> Result<Vec<Post>, RelayError> {
        match &self.fail {
            Some(err) => Err(err.clone()),
            None => Ok(self.posts.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Photo(String),
    Document(String),
    Caption(MessageId, String),
}

/// Records every call; message ids count up from 1.
#[derive(Clone, Default)]
pub struct RecordingMessenger {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub next_id: Arc<Mutex<MessageId>>,
    pub fail_sends_after: Option<usize>,
    pub fail_captions: bool,
}

impl RecordingMessenger {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn sent_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| !matches!(call, Call::Caption(..)))
            .count()
    }

    fn record_send(&self, call: Call) -> Result<MessageId, RelayError> {
        if let Some(limit) = self.fail_sends_after {
            if self.sent_count() >= limit {
                return Err(RelayError::new(FailureKind::HttpStatus(429), "Too Many Requests"));
            }
        }
        self.calls.lock().unwrap().push(call);
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        Ok(*next)
    }
}

#[async_trait::async_trait]
impl Messenger for RecordingMessenger {
    async fn send_photo(&self, photo_url: &str) -> Result<MessageId, RelayError> {
        self.record_send(Call::Photo(photo_url.to_string()))
    }

    async fn send_document(&self, document_url: &str) -> Result<MessageId, RelayError> {
        self.record_send(Call::Document(document_url.to_string()))
    }

    async fn edit_caption(&self, message_id: MessageId, caption: &str) -> Result<(), RelayError> {
        if self.fail_captions {
            return Err(RelayError::new(FailureKind::Api, "message can't be edited"));
        }
        self.calls
            .lock()
            .unwrap()
            .push(Call::Caption(message_id, caption.to_string()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct StubGalleries {
    pub galleries: HashMap<String, Result<Vec<String>, RelayError>>,
}

impl StubGalleries {
    pub fn with(mut self, url: &str, result: Result<Vec<&str>, RelayError>) -> Self {
        let result = result.map(|images| images.into_iter().map(str::to_string).collect());
        self.galleries.insert(url.to_string(), result);
        self
    }
}

#[async_trait::async_trait]
impl GalleryResolver for StubGalleries {
    async fn resolve(&self, gallery_url: &str) -> Result<Vec<String>, RelayError> {
        self.galleries
            .get(gallery_url)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[derive(Clone, Default)]
pub struct StubConnector {
    pub source: StubSource,
    pub messenger: RecordingMessenger,
    pub galleries: StubGalleries,
    pub fail: Option<RelayError>,
}

#[async_trait::async_trait]
impl Connector for StubConnector {
    async fn connect(&self, _config: &PollConfig) -> Result<Session, RelayError> {
        if let Some(err) = &self.fail {
            return Err(err.clone());
        }
        Ok(Session {
            source: Box::new(self.source.clone()),
            messenger: Box::new(self.messenger.clone()),
            galleries: Box::new(self.galleries.clone()),
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CycleEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<CycleEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: CycleEvent) {
        self.events.lock().unwrap().push(event);
    }
}
