//! Browser session module
//!
//! This module owns the seam between the crawler and the browser:
//! - `PageDriver`: the async trait every consumer codes against
//! - `ChromiumDriver`: the chromiumoxide-backed production implementation
//!   with a persistent on-disk profile

mod chromium;
mod driver;

pub use chromium::{find_chromium, ChromiumDriver};
pub use driver::{DriverError, DriverResult, PageDriver};
