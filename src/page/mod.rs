//! Page acquisition and target location: fetch strategies, the arena
//! DOM, and structural locators.

#[cfg(feature = "browser")]
pub mod browser;
pub mod dom;
pub mod fetch;
pub mod locator;

pub use dom::DomTree;
pub use fetch::{HttpFetcher, PageFetcher};
pub use locator::{Locator, PathStep};
