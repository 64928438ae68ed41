//! Procedures served by this application.
//!
//! | path | kind | input | output |
//! |---|---|---|---|
//! | `echo` | query | any | the input |
//! | `health` | query | none | `{"status":"ok"}` |
//! | `news.list` | query | `NewsListInput?` | `NewsItem[]`, newest first |
//! | `news.byId` | query | id | `NewsItem` |
//! | `news.add` | mutation | `NewNewsItem` | `NewsItem` |

use chrono::{Duration, Utc};
use newsdesk_core::models::{NewNewsItem, NewsItem, NewsListInput};
use newsdesk_core::{ProcedureRouter, RpcError};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// In-memory news items.
#[derive(Debug)]
pub struct NewsStore {
    items: RwLock<Vec<NewsItem>>,
    next_id: AtomicU64,
}

impl Default for NewsStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl NewsStore {
    pub fn new(items: Vec<NewsItem>) -> Self {
        let next_id = items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        Self {
            items: RwLock::new(items),
            next_id: AtomicU64::new(next_id),
        }
    }

    /// Store with a handful of sample stories.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let story = |id: u64, hours_ago: i64, title: &str, summary: &str, source: &str| NewsItem {
            id,
            title: title.to_string(),
            summary: summary.to_string(),
            source: source.to_string(),
            url: format!("https://example.com/news/{}", id),
            published_at: now - Duration::hours(hours_ago),
        };

        Self::new(vec![
            story(
                1,
                2,
                "City council approves new bike lanes",
                "Twelve kilometres of protected lanes are planned for next spring.",
                "Metro Daily",
            ),
            story(
                2,
                5,
                "Rust adoption grows in infrastructure teams",
                "Survey finds memory safety is the main reason teams switch.",
                "Tech Weekly",
            ),
            story(
                3,
                9,
                "Heatwave expected to break by the weekend",
                "Forecasters predict storms and cooler air from Friday.",
                "Weather Desk",
            ),
            story(
                4,
                26,
                "Local library extends opening hours",
                "Branches will stay open until 9pm on weekdays.",
                "Metro Daily",
            ),
        ])
    }

    /// Items matching `input`, newest first.
    pub async fn list(&self, input: &NewsListInput) -> Vec<NewsItem> {
        let items = self.items.read().await;
        let search = input.search.as_deref().unwrap_or("");

        let mut matching: Vec<NewsItem> = items
            .iter()
            .filter(|item| item.matches(search))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        if let Some(limit) = input.limit {
            matching.truncate(limit);
        }
        matching
    }

    pub async fn get(&self, id: u64) -> Option<NewsItem> {
        self.items.read().await.iter().find(|i| i.id == id).cloned()
    }

    pub async fn add(&self, new_item: NewNewsItem) -> NewsItem {
        let item = NewsItem {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: new_item.title,
            summary: new_item.summary,
            source: new_item.source,
            url: new_item.url,
            published_at: Utc::now(),
        };
        self.items.write().await.push(item.clone());
        info!("Added news item {}: {}", item.id, item.title);
        item
    }
}

/// The application's procedure router.
pub fn app_router(store: Arc<NewsStore>) -> ProcedureRouter {
    ProcedureRouter::new()
        .query("echo", |_ctx, input: Value| async move { Ok::<_, RpcError>(input) })
        .query("health", |_ctx, _: ()| async {
            Ok::<_, RpcError>(json!({"status": "ok"}))
        })
        .merge("news", news_router(store))
}

fn news_router(store: Arc<NewsStore>) -> ProcedureRouter {
    let list_store = store.clone();
    let get_store = store.clone();
    let add_store = store;

    ProcedureRouter::new()
        .query("list", move |_ctx, input: Option<NewsListInput>| {
            let store = list_store.clone();
            async move { Ok::<_, RpcError>(store.list(&input.unwrap_or_default()).await) }
        })
        .query("byId", move |_ctx, id: u64| {
            let store = get_store.clone();
            async move {
                store
                    .get(id)
                    .await
                    .ok_or_else(|| RpcError::not_found(format!("No news item with id {}", id)))
            }
        })
        .mutation("add", move |_ctx, new_item: NewNewsItem| {
            let store = add_store.clone();
            async move {
                if new_item.title.trim().is_empty() {
                    return Err(RpcError::bad_request("News item title must not be empty"));
                }
                Ok(store.add(new_item).await)
            }
        })
}
