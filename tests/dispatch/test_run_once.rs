//! Dispatch cycle properties through the public API

use promo_dispatch::catalog::memory::MemoryCatalog;
use promo_dispatch::catalog::{DeliveryStatus, PromotionalItem};
use promo_dispatch::{run_once, DispatchOutcome, Dispatcher, Error};

use super::support::{sent, tenis, FailingShortener, Post, RecordingChannel};

#[tokio::test]
async fn nothing_pending_sends_and_writes_nothing() {
    let catalog = MemoryCatalog::new(vec![sent(2), sent(3), sent(4)]);
    let channel = RecordingChannel::default();

    let result = run_once(&catalog, &channel).await.unwrap();

    assert_eq!(result.outcome, DispatchOutcome::NothingPending);
    assert!(result.item.is_none());
    assert!(channel.posts().is_empty());
    assert_eq!(catalog.ack_attempts(), 0);
}

#[tokio::test]
async fn empty_catalog_is_nothing_pending() {
    let catalog = MemoryCatalog::new(vec![]);
    let channel = RecordingChannel::default();

    let result = run_once(&catalog, &channel).await.unwrap();

    assert_eq!(result.outcome, DispatchOutcome::NothingPending);
}

#[tokio::test]
async fn single_pending_row_is_sent_once_and_marked() {
    let catalog = MemoryCatalog::new(vec![sent(3), tenis()]);
    let channel = RecordingChannel::default();

    let result = run_once(&catalog, &channel).await.unwrap();

    assert_eq!(result.outcome, DispatchOutcome::Sent);
    assert_eq!(result.item.as_ref().map(|i| i.row), Some(2));

    let posts = channel.posts();
    assert_eq!(posts.len(), 1);
    match &posts[0] {
        Post::Photo { photo, caption } => {
            assert_eq!(photo, "http://img.test/tenis.jpg");
            for value in ["Tênis X", "R$200", "R$99", "FROG10", "http://x.test/a"] {
                assert!(caption.contains(value), "caption misses {value}: {caption}");
            }
        }
        other => panic!("expected a photo post, got {:?}", other),
    }

    assert_eq!(catalog.status_of(2), Some(DeliveryStatus::Sent));
}

#[tokio::test]
async fn delivery_failure_leaves_row_pending() {
    let catalog = MemoryCatalog::new(vec![tenis()]);
    let channel = RecordingChannel::failing();

    let result = run_once(&catalog, &channel).await.unwrap();

    assert_eq!(result.outcome, DispatchOutcome::DeliveryFailed);
    assert_eq!(result.item.as_ref().map(|i| i.row), Some(2));
    assert_eq!(catalog.status_of(2), Some(DeliveryStatus::Pending));
    assert_eq!(catalog.ack_attempts(), 0);
}

#[tokio::test]
async fn ack_failure_allows_one_duplicate_on_next_cycle() {
    let catalog = MemoryCatalog::new(vec![tenis()]);
    let channel = RecordingChannel::default();
    catalog.fail_acks(true);

    let first = run_once(&catalog, &channel).await.unwrap();

    assert_eq!(first.outcome, DispatchOutcome::AckFailed);
    assert!(first.error.is_some());
    assert_eq!(catalog.status_of(2), Some(DeliveryStatus::Pending));

    catalog.fail_acks(false);
    let second = run_once(&catalog, &channel).await.unwrap();

    assert_eq!(second.outcome, DispatchOutcome::Sent);
    assert_eq!(channel.posts().len(), 2);
    assert_eq!(channel.posts()[0], channel.posts()[1]);
    assert_eq!(catalog.status_of(2), Some(DeliveryStatus::Sent));
}

#[tokio::test]
async fn row_deleted_during_cycle_is_ack_failure() {
    struct VanishingCatalog(MemoryCatalog);

    #[async_trait::async_trait]
    impl promo_dispatch::CatalogSource for VanishingCatalog {
        async fn load_snapshot(&self) -> promo_dispatch::Result<Vec<PromotionalItem>> {
            let items = self.0.load_snapshot().await?;
            self.0.remove(2);
            Ok(items)
        }

        async fn mark_sent(&self, row: u32) -> promo_dispatch::Result<()> {
            self.0.mark_sent(row).await
        }
    }

    let catalog = VanishingCatalog(MemoryCatalog::new(vec![tenis()]));
    let channel = RecordingChannel::default();

    let result = run_once(&catalog, &channel).await.unwrap();

    assert_eq!(result.outcome, DispatchOutcome::AckFailed);
    assert!(result.error.unwrap().contains("no longer exists"));
    assert_eq!(channel.posts().len(), 1);
}

#[tokio::test]
async fn unreadable_catalog_aborts_before_sending() {
    let catalog = MemoryCatalog::new(vec![tenis()]);
    catalog.fail_snapshot(true);
    let channel = RecordingChannel::default();

    let err = run_once(&catalog, &channel).await.unwrap_err();

    assert!(matches!(err, Error::SourceUnavailable(_)));
    assert!(channel.posts().is_empty());
}

#[tokio::test]
async fn lowest_pending_row_goes_first_across_cycles() {
    let mut later = tenis();
    later.row = 9;
    later.name = "Mochila".to_string();
    let mut earlier = tenis();
    earlier.row = 4;
    earlier.name = "Boné".to_string();
    let catalog = MemoryCatalog::new(vec![later, sent(2), earlier]);
    let channel = RecordingChannel::default();

    run_once(&catalog, &channel).await.unwrap();
    run_once(&catalog, &channel).await.unwrap();
    let third = run_once(&catalog, &channel).await.unwrap();

    let posts = channel.posts();
    assert!(posts[0].body().contains("Boné"));
    assert!(posts[1].body().contains("Mochila"));
    assert_eq!(third.outcome, DispatchOutcome::NothingPending);
}

#[tokio::test]
async fn failed_shortening_posts_original_link_verbatim() {
    let catalog = MemoryCatalog::new(vec![tenis()]);
    let channel = RecordingChannel::default();
    let shortener = FailingShortener;

    let result = Dispatcher::new(&catalog, &channel)
        .with_shortener(&shortener)
        .run_once()
        .await
        .unwrap();

    assert_eq!(result.outcome, DispatchOutcome::Sent);
    assert!(channel.posts()[0].body().contains("🛍️ http://x.test/a"));
}
