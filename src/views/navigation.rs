use serde::Serialize;

use crate::document::{Document, NavLink};

/// Published neighbours of one document within its type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Neighbors {
    /// Next older published document.
    pub previous: Option<NavLink>,
    /// Next newer published document.
    pub next: Option<NavLink>,
}

/// Find `target`'s published neighbours in `typed_list`.
///
/// `typed_list` is newest first, as returned by `ContentStore::get_all_content`.
/// Drafts are stepped over in both directions; the target itself may be a
/// draft. A target not in the list has no neighbours.
pub fn link(typed_list: &[Document], target: &Document) -> Neighbors {
    let Some(index) = typed_list
        .iter()
        .position(|d| d.source_uri == target.source_uri)
    else {
        return Neighbors::default();
    };

    let next = typed_list[..index]
        .iter()
        .rev()
        .find(|d| d.is_published())
        .map(NavLink::from);
    let previous = typed_list[index + 1..]
        .iter()
        .find(|d| d.is_published())
        .map(NavLink::from);

    Neighbors { previous, next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawStatus;
    use crate::store::tests::{day, doc};

    fn list() -> Vec<Document> {
        vec![
            doc("a.md", "post", RawStatus::Published, day(4), &[]),
            doc("b.md", "post", RawStatus::Draft, day(3), &[]),
            doc("c.md", "post", RawStatus::Published, day(2), &[]),
            doc("d.md", "post", RawStatus::Published, day(1), &[]),
        ]
    }

    fn uri(link: &Option<NavLink>) -> Option<&str> {
        link.as_ref().map(|l| l.output_uri.as_str())
    }

    #[test]
    fn test_drafts_are_skipped() {
        let docs = list();
        let c = link(&docs, &docs[2]);
        assert_eq!(uri(&c.previous), Some("d.html"));
        assert_eq!(uri(&c.next), Some("a.html"));

        let a = link(&docs, &docs[0]);
        assert_eq!(uri(&a.next), None);
        assert_eq!(uri(&a.previous), Some("c.html"));

        let d = link(&docs, &docs[3]);
        assert_eq!(uri(&d.previous), None);
        assert_eq!(uri(&d.next), Some("c.html"));
    }

    #[test]
    fn test_draft_target_still_gets_neighbors() {
        let docs = list();
        let b = link(&docs, &docs[1]);
        assert_eq!(uri(&b.next), Some("a.html"));
        assert_eq!(uri(&b.previous), Some("c.html"));
    }

    #[test]
    fn test_missing_target_and_lone_document() {
        let docs = list();
        let stranger = doc("z.md", "post", RawStatus::Published, day(9), &[]);
        assert_eq!(link(&docs, &stranger), Neighbors::default());

        let only = vec![doc("x.md", "post", RawStatus::Published, day(1), &[])];
        assert_eq!(link(&only, &only[0]), Neighbors::default());
    }

    #[test]
    fn test_all_drafts_around_target() {
        let docs = vec![
            doc("a.md", "post", RawStatus::Draft, day(3), &[]),
            doc("b.md", "post", RawStatus::Published, day(2), &[]),
            doc("c.md", "post", RawStatus::Draft, day(1), &[]),
        ];
        assert_eq!(link(&docs, &docs[1]), Neighbors::default());
    }
}
