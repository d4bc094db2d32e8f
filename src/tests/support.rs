use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::chain::Pubkey;
use crate::metadata::{MetadataError, MetadataFetcher, OffChainMetadata};
use crate::records::{FetchError, OnChainRecord, RecordSource};

pub(crate) const OWNER: &str = "Geh5Ss5knQGym81toYGXDbH3MFU2JCMK7E4QyeBHor1b";

/// Serves `https://img.test/<uri>.png` for every uri unless told otherwise,
/// and counts how often each uri was requested.
#[derive(Default)]
pub(crate) struct MockFetcher {
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
    imageless: HashSet<String>,
    delays: HashMap<String, Duration>,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail(mut self, uri: &str) -> Self {
        self.failing.insert(uri.to_string());
        self
    }

    pub(crate) fn without_image(mut self, uri: &str) -> Self {
        self.imageless.insert(uri.to_string());
        self
    }

    pub(crate) fn delay(mut self, uri: &str, delay: Duration) -> Self {
        self.delays.insert(uri.to_string(), delay);
        self
    }

    pub(crate) fn calls(&self, uri: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == uri).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl MetadataFetcher for MockFetcher {
    fn fetch(&self, uri: &str) -> BoxFuture<'static, Result<OffChainMetadata, MetadataError>> {
        self.calls.lock().unwrap().push(uri.to_string());
        let uri = uri.to_string();
        let delay = self.delays.get(&uri).copied();
        let fail = self.failing.contains(&uri);
        let imageless = self.imageless.contains(&uri);
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(MetadataError::Status { uri, status: 404 });
            }
            Ok(OffChainMetadata {
                name: Some(uri.clone()),
                image: (!imageless).then(|| format!("https://img.test/{uri}.png")),
                ..OffChainMetadata::default()
            })
        }
        .boxed()
    }
}

/// One record per name; the name doubles as the metadata uri.
pub(crate) fn mock_records(fetcher: &Arc<MockFetcher>, names: &[&str]) -> Vec<OnChainRecord> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            OnChainRecord::new(
                Pubkey::new_from_array([i as u8 + 1; 32]),
                *name,
                *name,
                fetcher.clone(),
            )
        })
        .collect()
}

/// Replays queued responses in order; the last one repeats.
pub(crate) struct MockSource {
    responses: Mutex<VecDeque<Result<Vec<OnChainRecord>, String>>>,
    calls: AtomicUsize,
}

impl MockSource {
    pub(crate) fn with_records(records: Vec<OnChainRecord>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Ok(records)])),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(message.to_string())])),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn then_fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub(crate) fn then_records(self, records: Vec<OnChainRecord>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(records));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordSource for MockSource {
    fn find_all_by_owner<'a>(
        &'a self,
        _owner: &'a Pubkey,
    ) -> BoxFuture<'a, Result<Vec<OnChainRecord>, FetchError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            }
        };
        async move {
            match response {
                Some(Ok(records)) => Ok(records),
                Some(Err(message)) => Err(FetchError::Source { message }),
                None => Ok(Vec::new()),
            }
        }
        .boxed()
    }
}
