//! End-to-end crawl task tests: both phases, auth walls, pause/resume.

use crate::crawler::test_helpers::{
    MockSiteClient, setup_crawler, setup_crawler_with, unapproved_stub, valid_stub, wait_for,
};
use crate::db::article_status;
use crate::types::{Event, Phase, Status};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn list_then_detail_end_to_end() {
    // Page 1 carries five stubs; only three are publishable
    let site = MockSiteClient::new().with_list_page(
        1,
        vec![
            valid_stub("a1"),
            valid_stub("a2"),
            valid_stub("a3"),
            unapproved_stub("x1"),
            unapproved_stub("x2"),
        ],
    );
    let (crawler, _site, _temp) = setup_crawler(site).await;
    let mut events = crawler.subscribe();

    let progress = crawler.start(1, 1, false, "session=abc").await.unwrap();
    let id = progress.session_id;

    wait_for(&crawler, id, "session completes", |p| p.status == Status::Completed).await;

    let progress = crawler.status(id).await.unwrap().unwrap();
    assert_eq!(progress.phase, Phase::Completed);
    assert_eq!(progress.current_page, 1);
    assert_eq!(progress.total_news, 3);
    assert_eq!(progress.crawled_news, 3);
    assert_eq!(progress.failed_news, 0);
    assert_eq!(progress.pending_news, 0);
    assert!(progress.finished_at.is_some());

    // The discarded stubs never reached storage
    let stats = crawler.stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.crawled, 3);

    // Crawled rows carry the parsed detail
    let article = crawler
        .db
        .get_article_by_source_id("a1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(article.status, article_status::CRAWLED);
    assert!(article.content.unwrap().contains("a1"));

    // Lifecycle events were broadcast
    let mut started = false;
    let mut completed = false;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::SessionStarted { id: eid, .. } if eid == id => started = true,
            Event::SessionCompleted { id: eid, crawled, .. } if eid == id => {
                completed = true;
                assert_eq!(crawled, 3);
            }
            _ => {}
        }
    }
    assert!(started, "missing SessionStarted event");
    assert!(completed, "missing SessionCompleted event");
}

#[tokio::test]
async fn list_phase_walks_pages_in_order() {
    let site = MockSiteClient::new()
        .with_list_page(4, vec![valid_stub("p4a"), valid_stub("p4b")])
        .with_list_page(5, vec![valid_stub("p5a")])
        .with_list_page(6, vec![valid_stub("p6a")]);
    let (crawler, _site, _temp) = setup_crawler(site).await;

    let progress = crawler.start(4, 6, false, "c").await.unwrap();
    let id = progress.session_id;

    wait_for(&crawler, id, "session completes", |p| p.status == Status::Completed).await;

    let progress = crawler.status(id).await.unwrap().unwrap();
    // current_page is relative to the range, not the absolute page number
    assert_eq!(progress.current_page, 3);
    assert_eq!(progress.total_pages, 3);
    assert_eq!(progress.total_news, 4);
    assert_eq!(progress.crawled_news, 4);
}

#[tokio::test]
async fn skip_existing_drops_known_articles() {
    let site = MockSiteClient::new()
        .with_list_page(1, vec![valid_stub("old1"), valid_stub("new1")]);
    let (crawler, _site, _temp) = setup_crawler(site).await;

    // old1 is already in storage from an earlier run
    crawler.db.insert_stubs(&[valid_stub("old1")]).await.unwrap();

    let progress = crawler.start(1, 1, true, "c").await.unwrap();
    let id = progress.session_id;

    wait_for(&crawler, id, "session completes", |p| p.status == Status::Completed).await;

    // Only the genuinely new article counts toward this session
    let progress = crawler.status(id).await.unwrap().unwrap();
    assert_eq!(progress.total_news, 1);

    // Both rows exist exactly once (old1 was pending, so the detail phase
    // crawled it along with new1)
    let stats = crawler.stats().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.crawled, 2);
}

#[tokio::test]
async fn auth_wall_fails_the_session() {
    let site = MockSiteClient::new()
        .with_list_page(1, vec![valid_stub("a1"), valid_stub("a2")])
        .with_auth_wall(2);
    let (crawler, _site, _temp) = setup_crawler(site).await;

    let progress = crawler.start(1, 3, true, "expired").await.unwrap();
    let id = progress.session_id;

    wait_for(&crawler, id, "session fails", |p| p.status == Status::Failed).await;

    // The session stopped before the detail phase; page 1's discoveries
    // stay pending for a later session
    let stats = crawler.stats().await.unwrap();
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.crawled, 0);
}

#[tokio::test]
async fn one_failing_article_does_not_stop_the_batch() {
    let site = MockSiteClient::new()
        .with_list_page(
            1,
            vec![
                valid_stub("f1"),
                valid_stub("f2"),
                valid_stub("f3"),
                valid_stub("f4"),
                valid_stub("f5"),
            ],
        )
        .with_failing_detail("f3");
    let (crawler, _site, _temp) = setup_crawler(site).await;

    let progress = crawler.start(1, 1, true, "c").await.unwrap();
    let id = progress.session_id;

    wait_for(&crawler, id, "session completes", |p| p.status == Status::Completed).await;

    let progress = crawler.status(id).await.unwrap().unwrap();
    assert_eq!(progress.crawled_news, 4);
    assert_eq!(progress.failed_news, 1);
    assert_eq!(progress.pending_news, 0);

    let failed = crawler
        .db
        .get_article_by_source_id("f3")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status, article_status::FAILED);
    assert!(failed.error_message.unwrap().contains("blew up"));
}

#[tokio::test]
async fn pause_then_resume_continues_from_pending_set() {
    // Slow list pacing so the pause lands between pages 1 and 2
    let site = MockSiteClient::new()
        .with_list_page(1, vec![valid_stub("p1"), valid_stub("p2")])
        .with_list_page(2, vec![valid_stub("p3")]);
    let (crawler, _site, _temp) = setup_crawler_with(site, |c| {
        c.list_page_delay_ms = 400;
    })
    .await;

    let progress = crawler.start(1, 2, true, "cookie-a").await.unwrap();
    let id = progress.session_id;

    // Wait for page 1 to be processed, then pause during the inter-page delay
    wait_for(&crawler, id, "page 1 is processed", |p| p.total_news == 2).await;
    crawler.pause(id).await.unwrap();

    let progress = crawler.status(id).await.unwrap().unwrap();
    assert_eq!(progress.status, Status::Paused);

    // Pausing twice in a row fails the second time
    assert!(crawler.pause(id).await.is_err());

    // Let the task notice the pause at its next cancellation point
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    let progress = crawler.status(id).await.unwrap().unwrap();
    assert_eq!(progress.status, Status::Paused);
    assert_eq!(progress.crawled_news, 0);

    // Resume picks up the stored pending set, detail-only: no further
    // listing fetches happen
    crawler.resume(id, "cookie-b").await.unwrap();
    wait_for(&crawler, id, "session completes", |p| p.status == Status::Completed).await;

    let progress = crawler.status(id).await.unwrap().unwrap();
    assert_eq!(progress.crawled_news, 2);
    assert_eq!(progress.pending_news, 0);

    let stats = crawler.stats().await.unwrap();
    assert_eq!(stats.crawled, 2);
    assert_eq!(stats.pending, 0);
}

#[tokio::test]
async fn resume_after_pause_does_not_refetch_listing_pages() {
    let site = MockSiteClient::new().with_list_page(1, vec![valid_stub("q1")]);
    let (crawler, site, _temp) = setup_crawler_with(site, |c| {
        c.list_page_delay_ms = 400;
    })
    .await;

    let progress = crawler.start(1, 2, true, "c").await.unwrap();
    let id = progress.session_id;

    wait_for(&crawler, id, "page 1 is processed", |p| p.total_news == 1).await;
    crawler.pause(id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let fetches_before_resume = site.list_fetches.load(Ordering::SeqCst);
    assert_eq!(fetches_before_resume, 1);

    crawler.resume(id, "c").await.unwrap();
    wait_for(&crawler, id, "session completes", |p| p.status == Status::Completed).await;

    // The resume ran the detail phase only: no further listing fetches and
    // current_page never advanced past the pre-pause value
    assert_eq!(site.list_fetches.load(Ordering::SeqCst), fetches_before_resume);
    let progress = crawler.status(id).await.unwrap().unwrap();
    assert_eq!(progress.current_page, 1);
    assert_eq!(progress.crawled_news, 1);
}

#[tokio::test]
async fn batches_drain_a_large_pending_set() {
    let stubs: Vec<_> = (0..45).map(|i| valid_stub(&format!("b{}", i))).collect();
    let site = MockSiteClient::new().with_list_page(1, stubs);
    // Small batches force multiple pool runs
    let (crawler, _site, _temp) = setup_crawler_with(site, |c| {
        c.batch_size = 10;
        c.concurrency = 4;
    })
    .await;

    let progress = crawler.start(1, 1, true, "c").await.unwrap();
    let id = progress.session_id;

    wait_for(&crawler, id, "session completes", |p| p.status == Status::Completed).await;

    let progress = crawler.status(id).await.unwrap().unwrap();
    assert_eq!(progress.crawled_news, 45);
    assert_eq!(progress.pending_news, 0);
    assert_eq!(progress.failed_news, 0);
}

#[tokio::test]
async fn full_task_respects_concurrency_limit() {
    let stubs: Vec<_> = (0..12).map(|i| valid_stub(&format!("c{}", i))).collect();
    let site = MockSiteClient::new()
        .with_list_page(1, stubs)
        .with_detail_delay(std::time::Duration::from_millis(25));
    let (crawler, site, _temp) = setup_crawler_with(site, |c| {
        c.concurrency = 3;
        c.batch_size = 12;
    })
    .await;

    let progress = crawler.start(1, 1, true, "c").await.unwrap();
    let id = progress.session_id;

    wait_for(&crawler, id, "session completes", |p| p.status == Status::Completed).await;

    let progress = crawler.status(id).await.unwrap().unwrap();
    assert_eq!(progress.crawled_news, 12);
    assert_eq!(site.detail_fetches.load(Ordering::SeqCst), 12);
    let max = site.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "observed {} concurrent fetches with limit 3", max);
}
