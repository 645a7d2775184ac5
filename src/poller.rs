use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::POLL_INTERVAL_SECS;
use crate::extractor::extract_matching;
use crate::fetcher::FetchListings;
use crate::notifier::SendAlert;
use crate::store::SeenAdStore;
use crate::types::SearchQuery;

/// Drives the fetch → extract → dedup → notify pipeline over the whole watch
/// list, forever. Failures inside one query's processing are logged at the
/// narrowest useful scope and never abort the sweep or the process.
pub struct Poller<F, N> {
    queries: Vec<SearchQuery>,
    fetcher: F,
    store: SeenAdStore,
    notifier: N,
}

impl<F: FetchListings, N: SendAlert> Poller<F, N> {
    pub fn new(queries: Vec<SearchQuery>, fetcher: F, store: SeenAdStore, notifier: N) -> Self {
        Self {
            queries,
            fetcher,
            store,
            notifier,
        }
    }

    pub async fn run(&self) {
        loop {
            self.sweep().await;
            info!("sweep complete, next in {POLL_INTERVAL_SECS}s");
            sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;
        }
    }

    /// One full pass over all configured queries.
    pub async fn sweep(&self) {
        for query in &self.queries {
            info!("searching {}...", query.query);
            if let Err(e) = self.process_query(query).await {
                error!("query {} failed: {e}", query.query);
            }
        }
    }

    async fn process_query(&self, query: &SearchQuery) -> crate::error::Result<()> {
        let html = match self.fetcher.fetch_rendered(query).await {
            Ok(html) => html,
            Err(e) => {
                // Transient site/browser trouble yields an empty cycle for
                // this query; the sweep moves on.
                warn!("fetch failed for {}: {e}", query.query);
                return Ok(());
            }
        };

        for ad in extract_matching(&html, query) {
            let seen = self.store.is_seen(&ad.id, &query.query).await?;
            info!(
                "checking ad {} \"{}\" ({}) - seen: {seen}",
                ad.id, ad.title, query.query
            );
            if seen {
                continue;
            }

            // Notify before marking: a delivery failure is logged and the ad
            // is still marked seen, so it is alerted at most once.
            if let Err(e) = self.notifier.send_new_ad(&ad, &query.query).await {
                error!("notification failed for ad {} ({}): {e}", ad.id, query.query);
            }
            if let Err(e) = self.store.mark_seen(&ad.id, &query.query).await {
                warn!("mark-seen failed for ad {} ({}): {e}", ad.id, query.query);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;
    use crate::types::AdRecord;

    /// Serves canned HTML per query; errors for queries in `failing`.
    struct ScriptedFetcher {
        pages: HashMap<String, String>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl FetchListings for ScriptedFetcher {
        async fn fetch_rendered(&self, query: &SearchQuery) -> crate::error::Result<String> {
            if self.failing.contains(&query.query) {
                return Err(AppError::Config("scripted fetch failure".to_string()));
            }
            Ok(self.pages.get(&query.query).cloned().unwrap_or_default())
        }
    }

    /// Records every delivery attempt; optionally fails them all.
    #[derive(Clone)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<(String, String)>>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new(fail: bool) -> Self {
            Self {
                sent: Arc::new(Mutex::new(Vec::new())),
                fail,
            }
        }

        fn attempts(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SendAlert for RecordingNotifier {
        async fn send_new_ad(&self, ad: &AdRecord, model: &str) -> crate::error::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((ad.id.clone(), model.to_string()));
            if self.fail {
                return Err(AppError::Telegram("scripted delivery failure".to_string()));
            }
            Ok(())
        }
    }

    fn tile(id: &str, title: &str, price: &str) -> String {
        format!(
            r#"<article class="aditem" data-adid="{id}">
                 <a class="ellipsis" href="/s-anzeige/angebot/{id}">{title}</a>
                 <p class="aditem-main--middle--price-shipping--price">{price}</p>
               </article>"#
        )
    }

    async fn poller_with(
        queries: Vec<SearchQuery>,
        fetcher: ScriptedFetcher,
        notifier: RecordingNotifier,
    ) -> Poller<ScriptedFetcher, RecordingNotifier> {
        let store = SeenAdStore::connect_in_memory().await.unwrap();
        Poller::new(queries, fetcher, store, notifier)
    }

    #[tokio::test]
    async fn new_ad_notified_once_then_deduped_across_sweeps() {
        let query = SearchQuery::new("iPad 10", 50, 230);
        let fetcher = ScriptedFetcher {
            pages: HashMap::from([(
                "iPad 10".to_string(),
                tile("X1", "iPad 10 wie neu", "120 €"),
            )]),
            failing: Vec::new(),
        };
        let notifier = RecordingNotifier::new(false);
        let poller = poller_with(vec![query], fetcher, notifier.clone()).await;

        poller.sweep().await;
        poller.sweep().await;

        // Same ad re-fetched on sweep two must not be re-notified.
        assert_eq!(
            notifier.attempts(),
            vec![("X1".to_string(), "iPad 10".to_string())]
        );
        assert!(poller.store.is_seen("X1", "iPad 10").await.unwrap());
    }

    #[tokio::test]
    async fn fetch_failure_does_not_stop_the_sweep() {
        let queries = vec![
            SearchQuery::new("iPad 10", 50, 230),
            SearchQuery::new("iPad Air 5", 50, 270),
            SearchQuery::new("iPad Mini 6", 50, 220),
        ];
        let fetcher = ScriptedFetcher {
            pages: HashMap::from([
                ("iPad 10".to_string(), tile("A", "iPad 10 silber", "100 €")),
                ("iPad Mini 6".to_string(), tile("B", "iPad Mini 6 64GB", "100 €")),
            ]),
            failing: vec!["iPad Air 5".to_string()],
        };
        let notifier = RecordingNotifier::new(false);
        let poller = poller_with(queries, fetcher, notifier.clone()).await;

        poller.sweep().await;

        assert_eq!(
            notifier.attempts(),
            vec![
                ("A".to_string(), "iPad 10".to_string()),
                ("B".to_string(), "iPad Mini 6".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn failed_delivery_still_marks_seen() {
        let query = SearchQuery::new("iPad 10", 50, 230);
        let fetcher = ScriptedFetcher {
            pages: HashMap::from([(
                "iPad 10".to_string(),
                tile("X1", "iPad 10 wie neu", "120 €"),
            )]),
            failing: Vec::new(),
        };
        let notifier = RecordingNotifier::new(true);
        let poller = poller_with(vec![query], fetcher, notifier.clone()).await;

        poller.sweep().await;
        assert!(poller.store.is_seen("X1", "iPad 10").await.unwrap());

        // At-most-once: the lost alert is never retried.
        poller.sweep().await;
        assert_eq!(notifier.attempts().len(), 1);
    }

    #[tokio::test]
    async fn same_ad_under_two_queries_is_tracked_independently() {
        let queries = vec![
            SearchQuery::new("iPad Air 5", 50, 270),
            SearchQuery::new("iPad Air 6", 50, 300),
        ];
        // One listing mentioning both models shows up in both result pages.
        let page = tile("X1", "iPad Air 5 und iPad Air 6 im Angebot", "100 €");
        let fetcher = ScriptedFetcher {
            pages: HashMap::from([
                ("iPad Air 5".to_string(), page.clone()),
                ("iPad Air 6".to_string(), page),
            ]),
            failing: Vec::new(),
        };
        let notifier = RecordingNotifier::new(false);
        let poller = poller_with(queries, fetcher, notifier.clone()).await;

        poller.sweep().await;

        assert_eq!(
            notifier.attempts(),
            vec![
                ("X1".to_string(), "iPad Air 5".to_string()),
                ("X1".to_string(), "iPad Air 6".to_string()),
            ]
        );
    }
}
