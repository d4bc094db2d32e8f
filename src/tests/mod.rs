use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::gallery::{Gallery, GalleryOptions, DEFAULT_FALLBACK_IMAGE};
use crate::output::{self, OutputFormat, PageReport};
use crate::pager::Direction;

pub(crate) mod support;

use support::{mock_records, MockFetcher, MockSource, OWNER};

fn gallery_over(
    fetcher: &Arc<MockFetcher>,
    names: &[&str],
    page_size: usize,
) -> Gallery<MockSource> {
    let source = MockSource::with_records(mock_records(fetcher, names));
    Gallery::new(
        source,
        GalleryOptions {
            page_size: NonZeroUsize::new(page_size).unwrap(),
            ..GalleryOptions::default()
        },
    )
}

fn visible_names(gallery: &Gallery<MockSource>) -> Vec<String> {
    gallery
        .visible_slice()
        .unwrap()
        .iter()
        .map(|e| e.name.clone())
        .collect()
}

#[tokio::test]
async fn five_records_one_per_page_walk_forward_and_back() {
    let fetcher = Arc::new(MockFetcher::new());
    let names = ["r0", "r1", "r2", "r3", "r4"];
    let mut gallery = gallery_over(&fetcher, &names, 1);

    gallery.fetch(OWNER).await.unwrap();
    assert_eq!(gallery.last_page(), 5);
    assert_eq!(visible_names(&gallery), vec!["r0"]);

    assert!(!gallery.change_page(Direction::Prev).await);
    assert_eq!(gallery.current_page(), 1);

    for expected in &names[1..] {
        assert!(gallery.change_page(Direction::Next).await);
        assert_eq!(visible_names(&gallery), vec![*expected]);
    }
    assert_eq!(gallery.current_page(), 5);
    assert!(!gallery.can_go_next());

    assert!(!gallery.change_page(Direction::Next).await);
    assert_eq!(gallery.current_page(), 5);
    assert_eq!(visible_names(&gallery), vec!["r4"]);

    for name in names {
        assert_eq!(fetcher.calls(name), 1);
    }
}

#[tokio::test]
async fn failed_metadata_is_not_refetched_on_return() {
    let fetcher = Arc::new(MockFetcher::new().fail("broken"));
    let mut gallery = gallery_over(&fetcher, &["broken", "fine"], 1);

    gallery.fetch(OWNER).await.unwrap();
    let first = gallery.visible_slice().unwrap()[0].clone();
    assert_eq!(first.image, DEFAULT_FALLBACK_IMAGE);
    assert!(first.image_is_fallback);
    assert!(first.error.is_some());

    assert!(gallery.change_page(Direction::Next).await);
    assert!(gallery.change_page(Direction::Prev).await);

    let again = &gallery.visible_slice().unwrap()[0];
    assert_eq!(again.image, DEFAULT_FALLBACK_IMAGE);
    assert_eq!(fetcher.calls("broken"), 1);
    assert_eq!(fetcher.calls("fine"), 1);
}

#[tokio::test]
async fn empty_wallet_has_no_pages() {
    let fetcher = Arc::new(MockFetcher::new());
    let mut gallery = gallery_over(&fetcher, &[], 3);

    gallery.fetch(OWNER).await.unwrap();

    assert_eq!(gallery.last_page(), 0);
    assert_eq!(gallery.visible_slice(), Some(&[][..]));
    assert!(!gallery.can_go_prev());
    assert!(!gallery.can_go_next());
    assert!(!gallery.change_page(Direction::Next).await);
    assert_eq!(fetcher.total_calls(), 0);
}

#[tokio::test]
async fn first_page_holds_min_of_page_size_and_len() {
    for (len, page_size) in [(2, 5), (5, 2), (3, 3)] {
        let fetcher = Arc::new(MockFetcher::new());
        let names: Vec<String> = (0..len).map(|i| format!("n{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut gallery = gallery_over(&fetcher, &names, page_size);

        gallery.fetch(OWNER).await.unwrap();

        assert_eq!(gallery.visible_slice().unwrap().len(), len.min(page_size));
        assert_eq!(fetcher.total_calls(), len.min(page_size));
    }
}

#[tokio::test]
async fn slow_first_record_keeps_its_place() {
    let fetcher = Arc::new(MockFetcher::new().delay("slow", Duration::from_millis(40)));
    let mut gallery = gallery_over(&fetcher, &["slow", "quick", "quicker"], 3);

    gallery.fetch(OWNER).await.unwrap();

    assert_eq!(visible_names(&gallery), vec!["slow", "quick", "quicker"]);
}

#[tokio::test]
async fn report_reflects_gallery_state() {
    let fetcher = Arc::new(MockFetcher::new().without_image("bare"));
    let mut gallery = gallery_over(&fetcher, &["pic", "bare", "third"], 2);
    assert!(PageReport::from_gallery(&gallery).is_none());

    gallery.fetch(OWNER).await.unwrap();
    let report = PageReport::from_gallery(&gallery).unwrap();

    assert_eq!(report.owner.as_deref(), Some(OWNER));
    assert_eq!(report.page, 1);
    assert_eq!(report.last_page, 2);
    assert_eq!(report.record_count, 3);
    assert!(!report.can_go_prev);
    assert!(report.can_go_next);
    assert_eq!(report.entries[0].image, "https://img.test/pic.png");
    assert_eq!(report.entries[1].image, DEFAULT_FALLBACK_IMAGE);
    assert!(report.entries[1].image_is_fallback);
    assert!(report.entries[1].error.is_none());

    let json: serde_json::Value =
        serde_json::from_str(&output::render(&report, OutputFormat::Json)).unwrap();
    assert_eq!(json["last_page"], 2);
    assert_eq!(json["entries"][1]["image"], DEFAULT_FALLBACK_IMAGE);
}
