//! Page shell: chrome around a content slot that can follow the search text.

use super::chrome::{header, HeaderProps, Sidebar};
use super::node::{Element, Node};
use super::state::{SearchHandle, SearchState};
use crate::config::ShellConfig;
use std::fmt;
use std::sync::Arc;

/// What dynamic content is rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentProps {
    pub search_query: String,
}

/// Renders content from the current shell state.
pub type ContentProducer = Arc<dyn Fn(&ContentProps) -> Node + Send + Sync>;

/// Content placed in the shell's `<main>` region.
#[derive(Clone, Default)]
pub enum ShellContent {
    /// Pre-rendered; emitted unchanged on every render.
    Static(Node),
    /// Re-invoked with the current search text on every render.
    Dynamic(ContentProducer),
    /// Nothing; the region renders empty.
    #[default]
    Empty,
}

impl ShellContent {
    pub fn dynamic<F>(producer: F) -> Self
    where
        F: Fn(&ContentProps) -> Node + Send + Sync + 'static,
    {
        ShellContent::Dynamic(Arc::new(producer))
    }

    fn render(&self, props: &ContentProps) -> Node {
        match self {
            ShellContent::Static(node) => node.clone(),
            ShellContent::Dynamic(producer) => producer(props),
            ShellContent::Empty => Node::Empty,
        }
    }
}

impl fmt::Debug for ShellContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellContent::Static(node) => f.debug_tuple("Static").field(node).finish(),
            ShellContent::Dynamic(_) => f.write_str("Dynamic(..)"),
            ShellContent::Empty => f.write_str("Empty"),
        }
    }
}

impl From<Node> for ShellContent {
    fn from(node: Node) -> Self {
        ShellContent::Static(node)
    }
}

impl From<Element> for ShellContent {
    fn from(element: Element) -> Self {
        ShellContent::Static(element.into())
    }
}

/// Layout wrapper owning the search text.
///
/// Renders the sidebar, then a padded column holding the header and `<main>`.
#[derive(Debug)]
pub struct PageShell {
    search: SearchState,
    sidebar: Sidebar,
    content: ShellContent,
}

impl PageShell {
    pub fn new(content: impl Into<ShellContent>) -> Self {
        Self {
            search: SearchState::new(),
            sidebar: Sidebar::default(),
            content: content.into(),
        }
    }

    /// Shell with no content.
    pub fn empty() -> Self {
        Self::new(ShellContent::Empty)
    }

    pub fn with_sidebar(mut self, sidebar: Sidebar) -> Self {
        self.sidebar = sidebar;
        self
    }

    pub fn search_query(&self) -> String {
        self.search.current()
    }

    /// Callback that updates the search text.
    pub fn search_handle(&self) -> SearchHandle {
        self.search.handle()
    }

    pub fn header_props(&self) -> HeaderProps {
        HeaderProps {
            search_query: self.search.current(),
            on_search_change: self.search.handle(),
        }
    }

    pub fn render(&self) -> Node {
        let props = ContentProps {
            search_query: self.search.current(),
        };

        let column = Element::new("div")
            .class(format!(
                "pl-[{}px] lg:pl-[{}px]",
                ShellConfig::SIDEBAR_WIDTH_PX,
                ShellConfig::SIDEBAR_WIDTH_LG_PX
            ))
            .child(header(&self.header_props()))
            .child(Element::new("main").child(self.content.render(&props)));

        Element::new("div")
            .class("min-h-screen")
            .child(self.sidebar.render())
            .child(column)
            .into()
    }

    /// Wait for the search text to change, then render again.
    pub async fn rerender_on_change(&mut self) -> Node {
        self.search.changed().await;
        self.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn main_region(node: &Node) -> Node {
        Node::Element(node.find("main").cloned().unwrap())
    }

    #[test]
    fn test_chrome_order() {
        let html = PageShell::new(Node::text("body")).render().to_html();
        let nav = html.find("<nav").unwrap();
        let header = html.find("<header").unwrap();
        let main = html.find("<main>").unwrap();
        assert!(nav < header && header < main);
        assert!(html.contains("pl-[50px] lg:pl-[70px]"));
    }

    #[test]
    fn test_empty_content_renders_chrome_only() {
        let shell = PageShell::empty();
        let node = shell.render();
        assert_eq!(main_region(&node).to_html(), "<main></main>");
        assert!(node.find("nav").is_some());
        assert!(node.find("header").is_some());
    }

    #[tokio::test]
    async fn test_static_content_unchanged_by_search() {
        let content: Node = Element::new("section").child("Welcome").into();
        let mut shell = PageShell::new(content.clone());
        let before = main_region(&shell.render());

        shell.search_handle().set("xyz");
        let after = shell.rerender_on_change().await;

        assert_eq!(main_region(&after), before);
        assert_eq!(main_region(&after).to_html(), "<main><section>Welcome</section></main>");
        assert_eq!(shell.search_query(), "xyz");
    }

    #[tokio::test]
    async fn test_dynamic_content_follows_typing() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let mut shell = PageShell::new(ShellContent::dynamic(move |props| {
            seen.lock().unwrap().push(props.search_query.clone());
            Node::text(format!("results for {}", props.search_query))
        }));

        shell.render();
        let handle = shell.search_handle();
        let mut last = Node::Empty;
        for typed in ["a", "ab", "abc"] {
            handle.set(typed);
            last = shell.rerender_on_change().await;
        }

        assert_eq!(*calls.lock().unwrap(), vec!["", "a", "ab", "abc"]);
        assert_eq!(main_region(&last).text_content(), "results for abc");
        let input = last.find("input").unwrap();
        assert_eq!(input.get_attr("value"), Some("abc"));
    }

    #[tokio::test]
    async fn test_header_callback_updates_shell() {
        let mut shell = PageShell::empty();
        let props = shell.header_props();
        assert_eq!(props.search_query, "");

        props.on_search_change.set("elections");
        shell.rerender_on_change().await;
        assert_eq!(shell.search_query(), "elections");
    }
}
