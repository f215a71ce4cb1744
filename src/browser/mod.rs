//! Browser automation module
//!
//! This module owns the headless engine through ChromiumOxide: launch,
//! navigation with a network-idle wait and settle delay, in-page evaluation,
//! and guaranteed shutdown. It is the only part of the crate that talks to
//! the engine.

pub mod capture;
pub mod controller;
pub mod driver;
pub mod navigation;

pub use capture::{PageCapture, DOCUMENT_HTML_SCRIPT};
pub use controller::{BrowserConfig, BrowserSession, HARDENING_FLAGS};
pub use driver::PageDriver;
pub use navigation::{LoadOptions, NavigationResult, PageNavigator, UrlValidator, WaitUntil};
