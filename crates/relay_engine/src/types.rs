use std::fmt;

/// Sequence number of a polling cycle within one `Running` period, starting at 0.
pub type CycleId = u64;

/// Identifier of a message returned by the destination API.
pub type MessageId = i64;

/// One candidate post returned by the source listing. Identity is `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub url: String,
    pub title: String,
    pub id: Option<String>,
    pub permalink: Option<String>,
}

impl Post {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            id: None,
            permalink: None,
        }
    }
}

/// Stage reported by the cycle runner before it starts the work the stage names.
///
/// The numeric codes are what the front-end historically consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleProgress {
    Init,
    Fetching,
    Validating,
    SearchingNew,
    Persisting,
    Sending,
    Idle,
    Error,
}

impl CycleProgress {
    pub fn code(self) -> u8 {
        match self {
            CycleProgress::Init => 0,
            CycleProgress::Fetching => 1,
            CycleProgress::Validating => 2,
            CycleProgress::SearchingNew => 3,
            CycleProgress::Persisting => 4,
            CycleProgress::Sending => 5,
            CycleProgress::Idle => 6,
            CycleProgress::Error => 99,
        }
    }
}

/// Code emitted once the control loop has reached `Stopped`.
pub const STOPPED_CODE: u8 = 10;

/// Event reported by one cycle to its sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEvent {
    Progress(CycleProgress),
    /// Always follows `Progress(CycleProgress::Error)` immediately.
    Failed(RelayError),
}

/// Event delivered from the control loop to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    Progress {
        cycle: CycleId,
        progress: CycleProgress,
    },
    CycleFailed {
        cycle: CycleId,
        error: RelayError,
    },
    /// Terminal signal: the loop is back in `Stopped`.
    Stopped,
}

/// Summary of a successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    pub fetched: usize,
    pub validated: usize,
    pub new_posts: usize,
    pub delivered: usize,
}

/// Error value surfaced to the owner for a failed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayError {
    pub kind: FailureKind,
    pub message: String,
}

impl RelayError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind.is_transport()
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for RelayError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Timeout,
    HttpStatus(u16),
    /// The destination answered but rejected the call.
    Api,
    Parse,
    Config,
    NotFound,
    Io,
    Internal,
}

impl FailureKind {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FailureKind::Network
                | FailureKind::Timeout
                | FailureKind::HttpStatus(_)
                | FailureKind::Api
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Api => write!(f, "api error"),
            FailureKind::Parse => write!(f, "parse error"),
            FailureKind::Config => write!(f, "config error"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Internal => write!(f, "internal error"),
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> RelayError {
    if err.is_timeout() {
        return RelayError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return RelayError::new(FailureKind::Parse, err.to_string());
    }
    RelayError::new(FailureKind::Network, err.to_string())
}
