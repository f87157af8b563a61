pub mod bake;
pub mod config;
pub mod crawl;
pub mod db;
pub mod document;
pub mod error;
pub mod render;
pub mod store;
pub mod types;
pub mod views;
pub mod watch;

pub use bake::{BakeOptions, BakeReport, Site};
pub use config::Config;
pub use document::{Document, NavLink, RawStatus, Status};
pub use error::{KilnError, Result};
pub use store::ContentStore;
pub use types::DocumentTypes;
