use std::collections::BTreeSet;

use serde::Serialize;

use crate::document::NavLink;
use crate::error::Result;
use crate::store::ContentStore;

/// One tag page's worth of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    pub name: String,
    pub uri: String,
    pub tagged_posts: Vec<NavLink>,
    pub tagged_documents: Vec<NavLink>,
}

/// Output URI of a tag page. Tags are used verbatim.
pub fn tag_uri(prefix: &str, tag: &str, extension: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("{}{}", tag, extension)
    } else {
        format!("{}/{}{}", prefix, tag, extension)
    }
}

/// Build an entry per tag, in tag order.
pub async fn build_tag_index(
    store: &ContentStore,
    tags: &BTreeSet<String>,
    prefix: &str,
    extension: &str,
) -> Result<Vec<TagEntry>> {
    let mut entries = Vec::with_capacity(tags.len());
    for tag in tags {
        let posts = store.get_published_posts_by_tag(tag).await?;
        let documents = store.get_published_documents_by_tag(tag).await?;
        entries.push(TagEntry {
            name: tag.clone(),
            uri: tag_uri(prefix, tag, extension),
            tagged_posts: posts.iter().map(NavLink::from).collect(),
            tagged_documents: documents.iter().map(NavLink::from).collect(),
        });
    }
    log::debug!("Built tag index with {} entries", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawStatus;
    use crate::store::tests::{day, doc, setup_test_store};

    #[test]
    fn test_tag_uris() {
        assert_eq!(tag_uri("tags", "blog", ".html"), "tags/blog.html");
        assert_eq!(tag_uri("", "blog", ".html"), "blog.html");
        assert_eq!(tag_uri("tags", "blog", ""), "tags/blog");
        assert_eq!(tag_uri("tags/", "Blog", ".html"), "tags/Blog.html");
    }

    #[tokio::test]
    async fn test_build_tag_index() {
        let (store, _temp) = setup_test_store().await;
        store.upsert(&doc("p1.md", "post", RawStatus::Published, day(2), &["rust", "web"])).await.unwrap();
        store.upsert(&doc("p2.md", "post", RawStatus::Published, day(3), &["rust"])).await.unwrap();
        store.upsert(&doc("about.md", "page", RawStatus::Published, day(1), &["rust"])).await.unwrap();
        store.upsert(&doc("wip.md", "post", RawStatus::Draft, day(4), &["rust", "secret"])).await.unwrap();

        let tags = store.all_tags().await.unwrap();
        assert_eq!(tags.iter().map(String::as_str).collect::<Vec<_>>(), vec!["rust", "web"]);

        let index = build_tag_index(&store, &tags, "tags", ".html").await.unwrap();
        assert_eq!(index.len(), 2);

        let rust = &index[0];
        assert_eq!(rust.name, "rust");
        assert_eq!(rust.uri, "tags/rust.html");
        let posts: Vec<&str> = rust.tagged_posts.iter().map(|l| l.output_uri.as_str()).collect();
        assert_eq!(posts, vec!["p2.html", "p1.html"]);
        let docs: Vec<&str> = rust.tagged_documents.iter().map(|l| l.output_uri.as_str()).collect();
        assert_eq!(docs, vec!["p2.html", "p1.html", "about.html"]);

        assert_eq!(index[1].tagged_posts.len(), 1);
    }
}
