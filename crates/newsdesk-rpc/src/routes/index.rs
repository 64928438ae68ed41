//! Root page (`/`).

use crate::config::HomeVariant;
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::response::Html;
use newsdesk_core::config::AppConfig;
use newsdesk_core::models::{NewsItem, NewsListInput};
use newsdesk_core::shell::{document, Element};
use newsdesk_core::{
    EmptyContext, Node, PageShell, QueryError, QueryKey, QueryProvider, QueryState, ShellContent,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Query parameters of the root page.
#[derive(Debug, Default, Deserialize)]
pub struct HomeParams {
    /// Initial search text.
    pub q: Option<String>,
}

/// Render the configured home page.
pub async fn home(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HomeParams>,
) -> Html<String> {
    let shell = match state.config.home {
        HomeVariant::News => news_page(&state).await,
        HomeVariant::Landing => landing_page(),
    };

    if let Some(q) = params.q {
        shell.header_props().on_search_change.set(q);
    }

    Html(document(AppConfig::APP_NAME, &shell.render()))
}

/// Shell whose content is the news feed.
///
/// Each request gets its own provider, so nothing fetched while rendering one
/// page is visible to another.
async fn news_page(state: &AppState) -> PageShell {
    let provider = QueryProvider::new(state.config.query.clone());
    let router = state.router.clone();
    let input = serde_json::to_value(NewsListInput::default()).unwrap_or_default();
    let key = QueryKey::procedure("news.list", &input);

    let feed: QueryState<Vec<NewsItem>> = provider
        .client()
        .fetch_typed(key, move || async move {
            router
                .call(EmptyContext, "news.list", input)
                .await
                .map_err(QueryError::from)
        })
        .await;

    if let QueryState::Error(err) = &feed {
        warn!("Failed to load news feed: {}", err);
    }

    PageShell::new(news_feed(feed))
}

/// Feed content filtered by the shell's search text.
pub fn news_feed(feed: QueryState<Vec<NewsItem>>) -> ShellContent {
    ShellContent::dynamic(move |props| render_feed(&feed, &props.search_query))
}

fn render_feed(feed: &QueryState<Vec<NewsItem>>, search_query: &str) -> Node {
    match feed {
        QueryState::Loading => Element::new("p")
            .class("feed-status")
            .child("Loading news...")
            .into(),
        QueryState::Error(err) => Element::new("p")
            .class("feed-error")
            .attr("role", "alert")
            .child(format!("Could not load news: {}", err))
            .into(),
        QueryState::Success { data, .. } => {
            let items: Vec<&NewsItem> = data.iter().filter(|i| i.matches(search_query)).collect();
            debug!(
                "Rendering {} of {} stories for {:?}",
                items.len(),
                data.len(),
                search_query
            );

            if items.is_empty() {
                let message = if search_query.trim().is_empty() {
                    "No stories yet".to_string()
                } else {
                    format!("No stories match \"{}\"", search_query.trim())
                };
                return Element::new("p").class("feed-empty").child(message).into();
            }

            Element::new("section")
                .class("news-feed")
                .children(items.into_iter().map(story))
                .into()
        }
    }
}

fn story(item: &NewsItem) -> Node {
    let byline = format!(
        "{} · {}",
        item.source,
        item.published_at.format("%b %e, %H:%M UTC")
    );

    Element::new("article")
        .attr("data-id", item.id.to_string())
        .child(
            Element::new("h2").child(
                Element::new("a")
                    .attr("href", item.url.as_str())
                    .child(item.title.as_str()),
            ),
        )
        .child(Element::new("p").child(item.summary.as_str()))
        .child(Element::new("footer").child(byline))
        .into()
}

fn landing_page() -> PageShell {
    let hero = Element::new("section")
        .class("landing")
        .child(Element::new("h1").child(AppConfig::APP_NAME))
        .child(Element::new("p").child("Headlines from every source, filtered as you type."))
        .child(Element::new("a").attr("href", "/?q=").child("Open the feed"));

    PageShell::new(hero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: u64, title: &str) -> NewsItem {
        NewsItem {
            id,
            title: title.to_string(),
            summary: "summary".to_string(),
            source: "Wire".to_string(),
            url: format!("https://example.com/{}", id),
            published_at: Utc::now(),
        }
    }

    fn loaded(items: Vec<NewsItem>) -> QueryState<Vec<NewsItem>> {
        QueryState::Success {
            data: items,
            is_stale: false,
        }
    }

    #[test]
    fn test_feed_follows_search_text() {
        let shell = PageShell::new(news_feed(loaded(vec![
            item(1, "Rust 2.0 released"),
            item(2, "Markets rally"),
        ])));

        let html = shell.render().to_html();
        assert!(html.contains("Rust 2.0 released"));
        assert!(html.contains("Markets rally"));

        shell.search_handle().set("rust");
        let html = shell.render().to_html();
        assert!(html.contains("Rust 2.0 released"));
        assert!(!html.contains("Markets rally"));
    }

    #[test]
    fn test_feed_states() {
        let empty = render_feed(&loaded(vec![item(1, "Rust")]), "golf").to_html();
        assert!(empty.contains("No stories match &quot;golf&quot;"));

        let none = render_feed(&loaded(Vec::new()), "").to_html();
        assert!(none.contains("No stories yet"));

        let loading = render_feed(&QueryState::Loading, "").to_html();
        assert!(loading.contains("Loading news"));

        let failed = render_feed(&QueryState::Error(QueryError::new("boom")), "").to_html();
        assert!(failed.contains("role=\"alert\""));
        assert!(failed.contains("boom"));
    }

    #[test]
    fn test_landing_is_static() {
        let shell = landing_page();
        let before = shell.render().to_html();
        shell.search_handle().set("anything");
        let after = shell.render().to_html();

        assert!(before.contains("Headlines from every source"));
        assert_eq!(
            before.replace("value=\"\"", ""),
            after.replace("value=\"anything\"", "")
        );
    }
}
