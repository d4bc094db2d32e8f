//! Client-side paging over a [`RecordSet`].
//!
//! Nothing here performs I/O on its own: a page is resolved by running the
//! metadata tasks of the records it covers, and navigation limits are plain
//! functions of the record count, page size and page number.

use std::num::NonZeroUsize;
use std::ops::Range;

use futures::future::join_all;
use tracing::debug;

use crate::records::{OnChainRecord, RecordSet};
use crate::task::MetadataOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "p" | "prev" | "previous" => Some(Self::Prev),
            "n" | "next" => Some(Self::Next),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageCursor {
    page_number: NonZeroUsize,
    page_size: NonZeroUsize,
}

impl PageCursor {
    pub fn first(page_size: NonZeroUsize) -> Self {
        Self {
            page_number: NonZeroUsize::MIN,
            page_size,
        }
    }

    pub fn new(page_number: usize, page_size: NonZeroUsize) -> Option<Self> {
        Some(Self {
            page_number: NonZeroUsize::new(page_number)?,
            page_size,
        })
    }

    pub fn page_number(&self) -> usize {
        self.page_number.get()
    }

    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    pub fn start_index(&self) -> usize {
        (self.page_number() - 1).saturating_mul(self.page_size())
    }

    /// Exclusive.
    pub fn end_index(&self) -> usize {
        self.start_index().saturating_add(self.page_size())
    }

    /// The cursor's index range clipped to a set of `len` records.
    pub fn range(&self, len: usize) -> Range<usize> {
        let end = self.end_index().min(len);
        self.start_index().min(end)..end
    }

    /// The neighbouring cursor, or `None` when `direction` is disabled.
    pub fn step(&self, direction: Direction, len: usize) -> Option<Self> {
        let nav = navigation(Some(len), self.page_size, self.page_number());
        match direction {
            Direction::Prev if nav.can_go_prev => Self::new(self.page_number() - 1, self.page_size),
            Direction::Next if nav.can_go_next => Self::new(self.page_number() + 1, self.page_size),
            _ => None,
        }
    }
}

/// Number of pages needed for `len` records; zero for an empty set.
pub fn last_page(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Navigation {
    pub can_go_prev: bool,
    pub can_go_next: bool,
    pub last_page: usize,
}

/// Which directions are open for `page_number`. `len` is `None` when no
/// record set has been loaded; navigation is then fully disabled, as it is
/// for an empty set.
pub fn navigation(len: Option<usize>, page_size: NonZeroUsize, page_number: usize) -> Navigation {
    let Some(len) = len.filter(|len| *len > 0) else {
        return Navigation::default();
    };
    let last_page = last_page(len, page_size);
    Navigation {
        can_go_prev: page_number > 1,
        can_go_next: page_number < last_page,
        last_page,
    }
}

/// A record in view together with its settled metadata.
#[derive(Clone, Debug)]
pub struct PageEntry {
    pub index: usize,
    pub record: OnChainRecord,
    pub metadata: MetadataOutcome,
}

impl PageEntry {
    pub fn image_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match &self.metadata {
            Ok(metadata) => metadata.image_or(fallback),
            Err(_) => fallback,
        }
    }

    /// The on-chain name, or the off-chain one when the account left it blank.
    pub fn display_name(&self) -> &str {
        if !self.record.name.is_empty() {
            return &self.record.name;
        }
        self.metadata
            .as_ref()
            .ok()
            .and_then(|m| m.name.as_deref())
            .unwrap_or_default()
    }
}

/// Resolves the metadata of every record in the cursor's range and returns
/// them in record-set order.
///
/// Only unstarted tasks are run; tasks already in flight are awaited and
/// settled ones are reused. A failed fetch stays local to its entry.
pub async fn resolve_page(records: &RecordSet, cursor: PageCursor) -> Vec<PageEntry> {
    let range = cursor.range(records.len());
    let in_view = records.slice(range.clone());
    let started = in_view
        .iter()
        .filter(|r| r.metadata_task.is_pending())
        .count();
    debug!(
        page = cursor.page_number(),
        start = range.start,
        end = range.end,
        started,
        "resolving page"
    );

    let outcomes = join_all(in_view.iter().map(|r| r.metadata_task.run())).await;

    range
        .zip(in_view.iter().zip(outcomes))
        .map(|(index, (record, metadata))| PageEntry {
            index,
            record: record.clone(),
            metadata,
        })
        .collect()
}
