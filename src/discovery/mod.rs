//! Discovery module - product URL discovery on category listings
//!
//! Two independent matchers (structural product cards, generic URL shape)
//! feed a paginate loop that collects unique product URLs in first-seen
//! order up to a target count.

mod crawler;
mod matchers;

pub use crawler::{CategoryCrawler, DiscoveryError};
pub use matchers::{
    next_page_url, product_card_links, url_shape_links, ProductUrl, ProductUrlShape,
};
