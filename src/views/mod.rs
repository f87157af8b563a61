//! Derived views over the store: navigation, pagination and tags.

pub mod navigation;
pub mod pagination;
pub mod tags;

pub use navigation::{Neighbors, link};
pub use pagination::{PageContext, Paginator};
pub use tags::{TagEntry, build_tag_index, tag_uri};
