//! Data types shared by the server and its clients.

pub mod news;

pub use news::{NewNewsItem, NewsItem, NewsListInput};
