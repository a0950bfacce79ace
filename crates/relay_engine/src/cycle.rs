use relay_logging::{relay_debug, relay_error, relay_info};

use crate::config::{Endpoints, HttpSettings, PollConfig};
use crate::delivery::{deliver, Messenger, Pacing, TelegramMessenger};
use crate::ledger::{filter_new, Ledger};
use crate::media::{classify, GalleryResolver, HttpGalleryResolver, MediaKind};
use crate::source::{user_agent, RedditSource, Source};
use crate::{CycleEvent, CycleProgress, CycleReport, Post, RelayError};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: CycleEvent);
}

/// External clients one cycle talks to.
pub struct Session {
    pub source: Box<dyn Source>,
    pub messenger: Box<dyn Messenger>,
    pub galleries: Box<dyn GalleryResolver>,
}

/// Builds the clients for a cycle from its configuration snapshot.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &PollConfig) -> Result<Session, RelayError>;
}

/// Connects to the real content and messaging APIs.
#[derive(Debug, Clone, Default)]
pub struct LiveConnector {
    pub endpoints: Endpoints,
    pub http: HttpSettings,
}

#[async_trait::async_trait]
impl Connector for LiveConnector {
    async fn connect(&self, config: &PollConfig) -> Result<Session, RelayError> {
        let client = self.http.build_client()?;
        let messenger = TelegramMessenger::connect(
            client.clone(),
            &self.endpoints.telegram_api,
            &config.destination,
        )
        .await?;
        let source = RedditSource::login(
            client.clone(),
            &self.endpoints.reddit_auth,
            &self.endpoints.reddit_api,
            &config.credentials,
        )
        .await?;
        let galleries = HttpGalleryResolver::new(client, user_agent(&config.credentials));

        Ok(Session {
            source: Box::new(source),
            messenger: Box::new(messenger),
            galleries: Box::new(galleries),
        })
    }
}

/// One polling cycle, as seen by the control loop.
#[async_trait::async_trait]
pub trait Cycle: Send + Sync {
    async fn run(&self, config: &PollConfig, sink: &dyn ProgressSink)
        -> Result<CycleReport, RelayError>;
}

/// Posts whose url classifies as deliverable media, in input order.
pub fn validate_posts(posts: Vec<Post>) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|post| match classify(&post.url) {
            MediaKind::Unsupported(_) => {
                relay_debug!("[-] {}", post.url);
                false
            }
            _ => {
                relay_debug!("[+] {}", post.url);
                true
            }
        })
        .collect()
}

/// Fetch → validate → dedup → persist → deliver.
pub struct CycleRunner {
    connector: Box<dyn Connector>,
    ledger: Ledger,
    pacing: Pacing,
}

impl CycleRunner {
    pub fn new(connector: Box<dyn Connector>, ledger: Ledger) -> Self {
        Self {
            connector,
            ledger,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    async fn stages(
        &self,
        config: &PollConfig,
        sink: &dyn ProgressSink,
    ) -> Result<CycleReport, RelayError> {
        let mut report = CycleReport::default();

        sink.emit(CycleEvent::Progress(CycleProgress::Init));
        let session = self.connector.connect(config).await?;

        sink.emit(CycleEvent::Progress(CycleProgress::Fetching));
        let posts = session.source.fetch(&config.query).await?;
        report.fetched = posts.len();

        sink.emit(CycleEvent::Progress(CycleProgress::Validating));
        relay_info!("Validating posts url | Limit: {}", config.query.limit);
        let posts = validate_posts(posts);
        report.validated = posts.len();

        sink.emit(CycleEvent::Progress(CycleProgress::SearchingNew));
        relay_info!("Checking for new posts");
        let mut entries = self.ledger.load()?;
        let fresh = filter_new(posts, &entries);
        report.new_posts = fresh.len();

        if !fresh.is_empty() {
            sink.emit(CycleEvent::Progress(CycleProgress::Persisting));
            self.ledger
                .append(&mut entries, fresh.iter().map(|post| post.url.clone()))?;

            sink.emit(CycleEvent::Progress(CycleProgress::Sending));
            report.delivered = deliver(
                &fresh,
                session.messenger.as_ref(),
                session.galleries.as_ref(),
                &self.pacing,
            )
            .await?;
        }

        sink.emit(CycleEvent::Progress(CycleProgress::Idle));
        Ok(report)
    }
}

#[async_trait::async_trait]
impl Cycle for CycleRunner {
    async fn run(
        &self,
        config: &PollConfig,
        sink: &dyn ProgressSink,
    ) -> Result<CycleReport, RelayError> {
        relay_info!("Start parsing");
        match self.stages(config, sink).await {
            Ok(report) => {
                relay_info!(
                    "Cycle finished: fetched={} validated={} new={} delivered={}",
                    report.fetched,
                    report.validated,
                    report.new_posts,
                    report.delivered
                );
                Ok(report)
            }
            Err(err) => {
                relay_error!("Cycle failed: {}", err);
                sink.emit(CycleEvent::Progress(CycleProgress::Error));
                sink.emit(CycleEvent::Failed(err.clone()));
                Err(err)
            }
        }
    }
}
