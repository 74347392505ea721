use std::fmt;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::dummyjson::{self, Comment, FetchError, Post, User};

pub trait FeedService: Send + Sync {
    fn load_posts(&self) -> Result<Vec<Post>, FetchError>;
    fn load_users(&self) -> Result<Vec<User>, FetchError>;
    fn load_comments(&self) -> Result<Vec<Comment>, FetchError>;
}

/// The three collections one load cycle works from. Any of them may be
/// empty when its fetch failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collections {
    pub posts: Vec<Post>,
    pub users: Vec<User>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Posts,
    Users,
    Comments,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Users => "users",
            Collection::Comments => "comments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Network,
    Parse,
}

impl FailureKind {
    pub fn of(err: &FetchError) -> Self {
        match err {
            FetchError::Status { .. } | FetchError::Transport { .. } => FailureKind::Network,
            FetchError::Parse { .. } => FailureKind::Parse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub collection: Collection,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FailureKind::Network => "network error",
            FailureKind::Parse => "parse error",
        };
        write!(f, "{} unavailable ({kind}): {}", self.collection, self.message)
    }
}

/// Receives every failure that was degraded to an empty collection.
pub type FailureHook = Arc<dyn Fn(&FetchFailure) + Send + Sync>;

pub fn logging_hook() -> FailureHook {
    Arc::new(|failure: &FetchFailure| {
        tracing::warn!(
            collection = failure.collection.as_str(),
            kind = ?failure.kind,
            "{}",
            failure.message
        );
    })
}

/// Loads posts, users and comments concurrently and waits for all three.
/// Failures never escape: each one is reported to `hook` and replaced by an
/// empty collection.
pub fn fetch_all(service: &dyn FeedService, hook: &FailureHook) -> Collections {
    let (posts, users, comments) = thread::scope(|scope| {
        let posts = scope.spawn(|| service.load_posts());
        let users = scope.spawn(|| service.load_users());
        let comments = scope.spawn(|| service.load_comments());
        (join(posts), join(users), join(comments))
    });

    Collections {
        posts: degrade(Collection::Posts, posts, hook),
        users: degrade(Collection::Users, users, hook),
        comments: degrade(Collection::Comments, comments, hook),
    }
}

type Loaded<T> = Result<Result<Vec<T>, FetchError>, String>;

fn join<T>(handle: thread::ScopedJoinHandle<'_, Result<Vec<T>, FetchError>>) -> Loaded<T> {
    handle
        .join()
        .map_err(|_| "fetch worker panicked".to_string())
}

fn degrade<T>(collection: Collection, loaded: Loaded<T>, hook: &FailureHook) -> Vec<T> {
    let failure = match loaded {
        Ok(Ok(items)) => {
            tracing::debug!(collection = collection.as_str(), count = items.len(), "fetched");
            return items;
        }
        Ok(Err(err)) => FetchFailure {
            collection,
            kind: FailureKind::of(&err),
            message: err.to_string(),
        },
        Err(message) => FetchFailure {
            collection,
            kind: FailureKind::Network,
            message,
        },
    };
    hook(&failure);
    Vec::new()
}

pub struct DummyJsonFeedService {
    client: Arc<dummyjson::Client>,
}

impl DummyJsonFeedService {
    pub fn new(client: Arc<dummyjson::Client>) -> Self {
        Self { client }
    }
}

impl FeedService for DummyJsonFeedService {
    fn load_posts(&self) -> Result<Vec<Post>, FetchError> {
        self.client.posts()
    }

    fn load_users(&self) -> Result<Vec<User>, FetchError> {
        self.client.users()
    }

    fn load_comments(&self) -> Result<Vec<Comment>, FetchError> {
        self.client.comments()
    }
}

/// Serves fixed collections; used in tests.
#[derive(Default)]
pub struct MockFeedService {
    collections: Mutex<Collections>,
    loads: Mutex<usize>,
}

impl MockFeedService {
    pub fn new(collections: Collections) -> Self {
        Self {
            collections: Mutex::new(collections),
            loads: Mutex::new(0),
        }
    }

    /// Number of completed post loads, one per cycle.
    pub fn cycles(&self) -> usize {
        *self.loads.lock()
    }
}

impl FeedService for MockFeedService {
    fn load_posts(&self) -> Result<Vec<Post>, FetchError> {
        *self.loads.lock() += 1;
        Ok(self.collections.lock().posts.clone())
    }

    fn load_users(&self) -> Result<Vec<User>, FetchError> {
        Ok(self.collections.lock().users.clone())
    }

    fn load_comments(&self) -> Result<Vec<Comment>, FetchError> {
        Ok(self.collections.lock().comments.clone())
    }
}
