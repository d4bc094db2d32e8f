//! One-shot, memoized metadata resolution for a single record.
//!
//! A task moves `Unstarted -> InFlight -> Resolved | Failed` exactly once.
//! Starting it spawns the fetch onto the current tokio runtime, so a fetch
//! keeps running even if every handle to it is dropped; the settled outcome
//! is kept and handed to any later caller without fetching again.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::metadata::{MetadataError, MetadataFetcher, OffChainMetadata};

pub type MetadataOutcome = Result<Arc<OffChainMetadata>, MetadataError>;

/// Cloneable future yielding the task's outcome.
pub type MetadataHandle = Shared<BoxFuture<'static, MetadataOutcome>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Unstarted,
    InFlight,
    Resolved,
    Failed,
}

enum TaskState {
    Unstarted,
    InFlight(MetadataHandle),
    Resolved(Arc<OffChainMetadata>),
    Failed(MetadataError),
}

struct TaskInner {
    uri: String,
    fetcher: Arc<dyn MetadataFetcher>,
    state: Mutex<TaskState>,
}

impl TaskInner {
    fn lock(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, outcome: &MetadataOutcome) {
        let mut state = self.lock();
        if matches!(*state, TaskState::InFlight(_)) {
            *state = match outcome {
                Ok(metadata) => TaskState::Resolved(Arc::clone(metadata)),
                Err(e) => TaskState::Failed(e.clone()),
            };
        }
    }
}

/// Clones share the same state, so a record copied into a page view still
/// sees (and contributes to) the single fetch.
#[derive(Clone)]
pub struct MetadataTask {
    inner: Arc<TaskInner>,
}

impl MetadataTask {
    pub fn new(uri: impl Into<String>, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                uri: uri.into(),
                fetcher,
                state: Mutex::new(TaskState::Unstarted),
            }),
        }
    }

    pub fn uri(&self) -> &str {
        &self.inner.uri
    }

    pub fn status(&self) -> TaskStatus {
        match &*self.inner.lock() {
            TaskState::Unstarted => TaskStatus::Unstarted,
            TaskState::InFlight(_) => TaskStatus::InFlight,
            TaskState::Resolved(_) => TaskStatus::Resolved,
            TaskState::Failed(_) => TaskStatus::Failed,
        }
    }

    /// True until the first `run`.
    pub fn is_pending(&self) -> bool {
        self.status() == TaskStatus::Unstarted
    }

    /// The settled outcome, if there is one yet.
    pub fn outcome(&self) -> Option<MetadataOutcome> {
        match &*self.inner.lock() {
            TaskState::Resolved(metadata) => Some(Ok(Arc::clone(metadata))),
            TaskState::Failed(e) => Some(Err(e.clone())),
            TaskState::Unstarted | TaskState::InFlight(_) => None,
        }
    }

    /// Starts the fetch if nobody has yet, and returns a handle to its
    /// outcome. Calling this again never fetches twice.
    pub fn run(&self) -> MetadataHandle {
        let mut state = self.inner.lock();
        let handle = match &*state {
            TaskState::Resolved(metadata) => return settled(Ok(Arc::clone(metadata))),
            TaskState::Failed(e) => return settled(Err(e.clone())),
            TaskState::InFlight(handle) => return handle.clone(),
            TaskState::Unstarted => self.start(),
        };
        *state = TaskState::InFlight(handle.clone());
        handle
    }

    pub async fn resolve(&self) -> MetadataOutcome {
        self.run().await
    }

    fn start(&self) -> MetadataHandle {
        let uri = self.inner.uri.clone();
        debug!(%uri, "starting metadata task");
        let fetch = self.inner.fetcher.fetch(&uri);
        // the handle is stored inside the task, so it may only hold a weak ref
        let weak: Weak<TaskInner> = Arc::downgrade(&self.inner);
        let settle_weak = weak.clone();
        let work = async move {
            let outcome = fetch.await.map(Arc::new);
            if let Err(e) = &outcome {
                warn!(error = %e, "metadata fetch failed");
            }
            if let Some(inner) = settle_weak.upgrade() {
                inner.settle(&outcome);
            }
            outcome
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let join = runtime.spawn(work);
                async move {
                    match join.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            let outcome = Err(MetadataError::Aborted {
                                uri,
                                message: e.to_string(),
                            });
                            if let Some(inner) = weak.upgrade() {
                                inner.settle(&outcome);
                            }
                            outcome
                        }
                    }
                }
                .boxed()
                .shared()
            }
            // no runtime to spawn on: the fetch is driven by whoever awaits
            Err(_) => work.boxed().shared(),
        }
    }
}

fn settled(outcome: MetadataOutcome) -> MetadataHandle {
    futures::future::ready(outcome).boxed().shared()
}

impl fmt::Debug for MetadataTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataTask")
            .field("uri", &self.inner.uri)
            .field("status", &self.status())
            .finish()
    }
}
