#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod data;
pub mod dummyjson;
pub mod feed;
pub mod logging;
pub mod pager;
pub mod popup;
pub mod render;
pub mod ui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
