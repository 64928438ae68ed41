//! Fixed navigational chrome: sidebar and header.

use super::node::{Element, Node};
use super::state::SearchHandle;
use crate::config::ShellConfig;

/// One sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: String,
    pub href: String,
}

impl NavItem {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }
}

/// Fixed-width navigation sidebar, wider at the `lg` breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidebar {
    pub items: Vec<NavItem>,
}

impl Default for Sidebar {
    fn default() -> Self {
        Self {
            items: vec![NavItem::new("Home", "/")],
        }
    }
}

impl Sidebar {
    pub fn render(&self) -> Node {
        let links = self.items.iter().map(|item| {
            Element::new("a")
                .attr("href", item.href.as_str())
                .attr("title", item.label.as_str())
                .child(item.label.as_str())
                .into()
        });

        Element::new("nav")
            .class(format!(
                "sidebar fixed inset-y-0 left-0 w-[{}px] lg:w-[{}px]",
                ShellConfig::SIDEBAR_WIDTH_PX,
                ShellConfig::SIDEBAR_WIDTH_LG_PX
            ))
            .children(links)
            .into()
    }
}

/// What the header receives from the shell.
#[derive(Debug, Clone)]
pub struct HeaderProps {
    pub search_query: String,
    pub on_search_change: SearchHandle,
}

/// Page header with the search box.
pub fn header(props: &HeaderProps) -> Node {
    let input = Element::new("input")
        .attr("type", "search")
        .attr("name", "q")
        .attr("value", props.search_query.as_str())
        .attr("placeholder", ShellConfig::SEARCH_PLACEHOLDER);

    Element::new("header")
        .class("header")
        .child(
            Element::new("form")
                .attr("role", "search")
                .attr("method", "get")
                .child(input),
        )
        .into()
}
