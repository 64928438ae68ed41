//! Page shell (layout) composition.

mod chrome;
mod document;
mod layout;
mod node;
mod state;

pub use chrome::{header, HeaderProps, NavItem, Sidebar};
pub use document::document;
pub use layout::{ContentProducer, ContentProps, PageShell, ShellContent};
pub use node::{Element, Node};
pub use state::{SearchHandle, SearchState};
