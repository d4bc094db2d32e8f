//! The stateful front of the crate: owns the current record set, the page
//! cursor and the visible slice, and exposes them as observable state.

use std::num::NonZeroUsize;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chain::Pubkey;
use crate::pager::{self, Direction, Navigation, PageCursor, PageEntry};
use crate::records::{FetchError, RecordSet, RecordSource};

pub const DEFAULT_FALLBACK_IMAGE: &str = "/fallbackImage.jpg";
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = NonZeroUsize::MIN;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryOptions {
    pub page_size: NonZeroUsize,
    pub fallback_image: String,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fallback_image: DEFAULT_FALLBACK_IMAGE.to_string(),
        }
    }
}

/// What a presentation layer shows for one record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VisibleEntry {
    pub index: usize,
    pub mint: String,
    pub name: String,
    pub image: String,
    pub image_is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VisibleEntry {
    fn from_entry(entry: &PageEntry, fallback: &str) -> Self {
        let image = entry
            .metadata
            .as_ref()
            .ok()
            .and_then(|metadata| metadata.image());
        Self {
            index: entry.index,
            mint: entry.record.mint.to_string(),
            name: entry.display_name().to_string(),
            image_is_fallback: image.is_none(),
            image: image.unwrap_or(fallback).to_string(),
            error: entry.metadata.as_ref().err().map(|e| e.to_string()),
        }
    }
}

/// A page resolution that has been issued but not yet applied.
///
/// It carries the generation and cursor it was issued for, so a result that
/// arrives after the gallery moved on can be recognised and dropped.
#[derive(Clone, Debug)]
pub struct PageRequest {
    generation: u64,
    cursor: PageCursor,
    records: RecordSet,
}

impl PageRequest {
    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub async fn resolve(self) -> ResolvedPage {
        let entries = pager::resolve_page(&self.records, self.cursor).await;
        ResolvedPage {
            generation: self.generation,
            cursor: self.cursor,
            entries,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedPage {
    generation: u64,
    cursor: PageCursor,
    entries: Vec<PageEntry>,
}

impl ResolvedPage {
    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }
}

pub struct Gallery<S> {
    source: S,
    options: GalleryOptions,
    records: Option<RecordSet>,
    cursor: PageCursor,
    generation: u64,
    loading: bool,
    view: Option<Vec<VisibleEntry>>,
    last_error: Option<FetchError>,
}

impl<S: RecordSource> Gallery<S> {
    pub fn new(source: S, options: GalleryOptions) -> Self {
        let cursor = PageCursor::first(options.page_size);
        Self {
            source,
            options,
            records: None,
            cursor,
            generation: 0,
            loading: false,
            view: None,
            last_error: None,
        }
    }

    pub fn options(&self) -> &GalleryOptions {
        &self.options
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// `None` while nothing has been loaded or a page is still resolving.
    pub fn visible_slice(&self) -> Option<&[VisibleEntry]> {
        self.view.as_deref()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn records(&self) -> Option<&RecordSet> {
        self.records.as_ref()
    }

    pub fn owner(&self) -> Option<Pubkey> {
        self.records.as_ref().map(RecordSet::owner)
    }

    pub fn record_count(&self) -> usize {
        self.records.as_ref().map_or(0, RecordSet::len)
    }

    pub fn current_page(&self) -> usize {
        self.cursor.page_number()
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn navigation(&self) -> Navigation {
        pager::navigation(
            self.records.as_ref().map(RecordSet::len),
            self.options.page_size,
            self.cursor.page_number(),
        )
    }

    pub fn last_page(&self) -> usize {
        self.navigation().last_page
    }

    pub fn can_go_prev(&self) -> bool {
        !self.loading && self.navigation().can_go_prev
    }

    pub fn can_go_next(&self) -> bool {
        !self.loading && self.navigation().can_go_next
    }

    /// Loads everything `owner` holds and shows the first page.
    ///
    /// A malformed address is rejected without touching the source or the
    /// current state. Any other failure keeps the previous record set, clears
    /// the view and leaves `loading` false.
    pub async fn fetch(&mut self, owner: &str) -> Result<(), FetchError> {
        let owner = match Pubkey::parse(owner) {
            Ok(owner) => owner,
            Err(e) => {
                let err = FetchError::from(e);
                self.last_error = Some(err.clone());
                return Err(err);
            }
        };

        self.generation += 1;
        self.loading = true;
        self.view = None;
        self.last_error = None;

        match self.source.find_all_by_owner(&owner).await {
            Ok(records) => {
                info!(%owner, count = records.len(), "record set installed");
                let records = RecordSet::new(owner, records);
                self.records = Some(records.clone());
                self.cursor = PageCursor::first(self.options.page_size);
                let page = self.issue(records).resolve().await;
                self.apply(page);
                Ok(())
            }
            Err(e) => {
                warn!(%owner, error = %e, "record set fetch failed");
                self.loading = false;
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Moves one page and resolves it. Returns false when the direction is
    /// disabled, in which case nothing changes.
    pub async fn change_page(&mut self, direction: Direction) -> bool {
        let Some(request) = self.begin_change_page(direction) else {
            return false;
        };
        let page = request.resolve().await;
        self.apply(page)
    }

    /// Moves the cursor and clears the view, returning the resolution the
    /// caller must run and hand back to [`Gallery::apply`].
    ///
    /// Issuing a new request makes every earlier one stale.
    pub fn begin_change_page(&mut self, direction: Direction) -> Option<PageRequest> {
        let records = self.records.clone()?;
        let Some(cursor) = self.cursor.step(direction, records.len()) else {
            debug!(?direction, page = self.cursor.page_number(), "navigation disabled");
            return None;
        };
        self.cursor = cursor;
        Some(self.issue(records))
    }

    /// Installs a resolved page if it is still the one the gallery is
    /// waiting for. Stale results are discarded and false is returned.
    pub fn apply(&mut self, page: ResolvedPage) -> bool {
        if page.generation != self.generation || page.cursor != self.cursor {
            debug!(
                page = page.cursor.page_number(),
                current = self.cursor.page_number(),
                "discarding stale page"
            );
            return false;
        }
        let fallback = self.options.fallback_image.as_str();
        self.view = Some(
            page.entries
                .iter()
                .map(|entry| VisibleEntry::from_entry(entry, fallback))
                .collect(),
        );
        self.loading = false;
        true
    }

    fn issue(&mut self, records: RecordSet) -> PageRequest {
        self.generation += 1;
        self.loading = true;
        self.view = None;
        PageRequest {
            generation: self.generation,
            cursor: self.cursor,
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tests::support::{mock_records, MockFetcher, MockSource, OWNER};

    fn options(page_size: usize) -> GalleryOptions {
        GalleryOptions {
            page_size: NonZeroUsize::new(page_size).unwrap(),
            ..GalleryOptions::default()
        }
    }

    fn names(gallery: &Gallery<MockSource>) -> Vec<String> {
        gallery
            .visible_slice()
            .unwrap()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    #[test]
    fn nothing_loaded_disables_everything() {
        let gallery = Gallery::new(MockSource::with_records(Vec::new()), options(2));
        assert!(!gallery.loading());
        assert!(gallery.visible_slice().is_none());
        assert!(!gallery.can_go_prev());
        assert!(!gallery.can_go_next());
        assert_eq!(gallery.last_page(), 0);
    }

    #[tokio::test]
    async fn fetch_shows_first_page() {
        let fetcher = Arc::new(MockFetcher::new());
        let source = MockSource::with_records(mock_records(&fetcher, &["a", "b", "c"]));
        let mut gallery = Gallery::new(source, options(2));

        gallery.fetch(OWNER).await.unwrap();

        assert!(!gallery.loading());
        assert_eq!(names(&gallery), vec!["a", "b"]);
        assert_eq!(gallery.current_page(), 1);
        assert_eq!(gallery.last_page(), 2);
        assert!(!gallery.can_go_prev());
        assert!(gallery.can_go_next());
        assert_eq!(fetcher.total_calls(), 2);
        assert_eq!(gallery.owner().map(|o| o.to_string()).as_deref(), Some(OWNER));
    }

    #[tokio::test]
    async fn invalid_owner_leaves_state_alone() {
        let fetcher = Arc::new(MockFetcher::new());
        let source = MockSource::with_records(mock_records(&fetcher, &["a"]));
        let mut gallery = Gallery::new(source, options(1));
        gallery.fetch(OWNER).await.unwrap();

        let err = gallery.fetch("0xdeadbeef").await.unwrap_err();

        assert!(err.is_invalid_identity());
        assert_eq!(gallery.last_error(), Some(&err));
        assert_eq!(gallery.source.calls(), 1);
        assert_eq!(names(&gallery), vec!["a"]);
        assert!(!gallery.loading());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_records() {
        let fetcher = Arc::new(MockFetcher::new());
        let source = MockSource::with_records(mock_records(&fetcher, &["a", "b"]))
            .then_fail("node is behind");
        let mut gallery = Gallery::new(source, options(1));
        gallery.fetch(OWNER).await.unwrap();

        let err = gallery.fetch(OWNER).await.unwrap_err();

        assert!(matches!(err, FetchError::Source { .. }));
        assert!(!gallery.loading());
        assert!(gallery.visible_slice().is_none());
        assert_eq!(gallery.record_count(), 2);
        assert!(gallery.last_error().is_some());
    }

    #[tokio::test]
    async fn refetch_replaces_records_and_resets_page() {
        let fetcher = Arc::new(MockFetcher::new());
        let source = MockSource::with_records(mock_records(&fetcher, &["a", "b", "c"]))
            .then_records(mock_records(&fetcher, &["x", "y"]));
        let mut gallery = Gallery::new(source, options(1));
        gallery.fetch(OWNER).await.unwrap();
        assert!(gallery.change_page(Direction::Next).await);
        assert_eq!(gallery.current_page(), 2);

        gallery.fetch(OWNER).await.unwrap();

        assert_eq!(gallery.current_page(), 1);
        assert_eq!(gallery.record_count(), 2);
        assert_eq!(names(&gallery), vec!["x"]);
    }

    #[tokio::test]
    async fn stale_resolution_is_discarded() {
        let fetcher = Arc::new(MockFetcher::new());
        let source = MockSource::with_records(mock_records(&fetcher, &["a", "b", "c"]));
        let mut gallery = Gallery::new(source, options(1));
        gallery.fetch(OWNER).await.unwrap();

        let to_second = gallery.begin_change_page(Direction::Next).unwrap();
        let to_third = gallery.begin_change_page(Direction::Next).unwrap();
        assert!(gallery.loading());
        assert!(!gallery.can_go_next());

        let third = to_third.resolve().await;
        let second = to_second.resolve().await;

        assert!(gallery.apply(third));
        assert!(!gallery.apply(second));
        assert_eq!(gallery.current_page(), 3);
        assert_eq!(names(&gallery), vec!["c"]);
        // the superseded page still warmed its record
        assert_eq!(fetcher.calls("b"), 1);
    }

    #[tokio::test]
    async fn refetch_invalidates_pending_pages() {
        let fetcher = Arc::new(MockFetcher::new());
        let source = MockSource::with_records(mock_records(&fetcher, &["a", "b"]));
        let mut gallery = Gallery::new(source, options(1));
        gallery.fetch(OWNER).await.unwrap();

        let pending = gallery.begin_change_page(Direction::Next).unwrap();
        gallery.fetch(OWNER).await.unwrap();

        assert!(!gallery.apply(pending.resolve().await));
        assert_eq!(gallery.current_page(), 1);
    }

    #[tokio::test]
    async fn failed_metadata_uses_fallback() {
        let fetcher = Arc::new(MockFetcher::new().fail("b").without_image("c"));
        let source = MockSource::with_records(mock_records(&fetcher, &["a", "b", "c"]));
        let mut gallery = Gallery::new(source, options(3));

        gallery.fetch(OWNER).await.unwrap();

        let view = gallery.visible_slice().unwrap();
        assert_eq!(view[0].image, "https://img.test/a.png");
        assert!(!view[0].image_is_fallback);
        assert_eq!(view[1].image, DEFAULT_FALLBACK_IMAGE);
        assert!(view[1].error.is_some());
        assert_eq!(view[2].image, DEFAULT_FALLBACK_IMAGE);
        assert!(view[2].error.is_none());
    }
}
