//! Classify logical URIs of the form `scheme://authority/collection[/id]`.
//!
//! A [`Router`] is built once at startup and handed to the provider. It never
//! touches storage; it only decides whether a string addresses the whole
//! collection, one item, or nothing we serve.

use std::fmt;

use crate::contract::{AUTHORITY, CONTENT_DIR_PREFIX, CONTENT_ITEM_PREFIX, PATH_BOOKS, SCHEME};

/// Outcome of matching a URI string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriMatch {
    Collection,
    Item(i64),
    Unmatched,
}

impl UriMatch {
    /// The addressed resource, or `None` for `Unmatched`.
    pub fn target(self) -> Option<Target> {
        match self {
            UriMatch::Collection => Some(Target::Collection),
            UriMatch::Item(id) => Some(Target::Item(id)),
            UriMatch::Unmatched => None,
        }
    }
}

/// A resource we actually serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Collection,
    Item(i64),
}

/// A canonical URI paired with the target it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUri {
    target: Target,
    text: String,
}

impl ResourceUri {
    pub fn target(&self) -> Target {
        self.target
    }

    /// Item id, when this URI addresses a single row.
    pub fn id(&self) -> Option<i64> {
        match self.target {
            Target::Item(id) => Some(id),
            Target::Collection => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// URI matcher configured with one scheme, authority and collection segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    scheme: String,
    authority: String,
    collection: String,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(SCHEME, AUTHORITY, PATH_BOOKS)
    }
}

impl Router {
    /// `collection` is a single path segment without slashes.
    pub fn new(
        scheme: impl Into<String>,
        authority: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
            collection: collection.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Classify `uri`. Query strings, fragments and empty path segments are
    /// ignored; an id segment must be plain ASCII digits that fit in `i64`.
    pub fn match_uri(&self, uri: &str) -> UriMatch {
        let Some((scheme, rest)) = uri.split_once("://") else {
            return UriMatch::Unmatched;
        };
        if scheme != self.scheme {
            return UriMatch::Unmatched;
        }

        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        if authority != self.authority {
            return UriMatch::Unmatched;
        }

        let mut segments = path.split('/').filter(|segment| !segment.is_empty());
        match (segments.next(), segments.next(), segments.next()) {
            (Some(collection), None, None) if collection == self.collection => {
                UriMatch::Collection
            }
            (Some(collection), Some(id), None) if collection == self.collection => {
                parse_id(id).map_or(UriMatch::Unmatched, UriMatch::Item)
            }
            _ => UriMatch::Unmatched,
        }
    }

    /// Canonical URI for `target`.
    pub fn uri_for(&self, target: Target) -> ResourceUri {
        let base = format!("{}://{}/{}", self.scheme, self.authority, self.collection);
        let text = match target {
            Target::Collection => base,
            Target::Item(id) => format!("{base}/{id}"),
        };
        ResourceUri { target, text }
    }

    pub fn collection_uri(&self) -> ResourceUri {
        self.uri_for(Target::Collection)
    }

    pub fn item_uri(&self, id: i64) -> ResourceUri {
        self.uri_for(Target::Item(id))
    }

    /// MIME type describing what a query on `target` returns.
    pub fn content_type(&self, target: Target) -> String {
        let prefix = match target {
            Target::Collection => CONTENT_DIR_PREFIX,
            Target::Item(_) => CONTENT_ITEM_PREFIX,
        };
        format!("{prefix}/{}/{}", self.authority, self.collection)
    }
}

fn parse_id(segment: &str) -> Option<i64> {
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        segment.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::default()
    }

    #[test]
    fn collection_path_matches_collection() {
        let router = router();
        assert_eq!(
            router.match_uri("content://com.example.bookstore/books"),
            UriMatch::Collection
        );
        assert_eq!(
            router.match_uri("content://com.example.bookstore/books/"),
            UriMatch::Collection
        );
    }

    #[test]
    fn numeric_segment_matches_item() {
        let router = router();
        assert_eq!(
            router.match_uri("content://com.example.bookstore/books/42"),
            UriMatch::Item(42)
        );
        assert_eq!(
            router.match_uri("content://com.example.bookstore/books/0?sort=title"),
            UriMatch::Item(0)
        );
    }

    #[test]
    fn foreign_or_malformed_uris_are_unmatched() {
        let router = router();
        for uri in [
            "content://com.example.bookstore",
            "content://other.authority/books",
            "https://com.example.bookstore/books",
            "com.example.bookstore/books",
            "content://com.example.bookstore/magazines",
            "content://com.example.bookstore/books/abc",
            "content://com.example.bookstore/books/-1",
            "content://com.example.bookstore/books/+1",
            "content://com.example.bookstore/books/1/2",
            "content://com.example.bookstore/books/99999999999999999999",
        ] {
            assert_eq!(router.match_uri(uri), UriMatch::Unmatched, "{uri}");
        }
    }

    #[test]
    fn built_uris_match_their_own_targets() {
        let router = router();
        let item = router.item_uri(5);

        assert_eq!(item.as_str(), "content://com.example.bookstore/books/5");
        assert_eq!(router.match_uri(item.as_str()), UriMatch::Item(5));
        assert_eq!(
            router.match_uri(router.collection_uri().as_str()),
            UriMatch::Collection
        );
    }

    #[test]
    fn custom_router_serves_only_its_own_authority() {
        let router = Router::new("content", "org.example.shelf", "volumes");

        assert_eq!(router.authority(), "org.example.shelf");
        assert_eq!(
            router.match_uri("content://org.example.shelf/volumes/3"),
            UriMatch::Item(3)
        );
        assert_eq!(
            router.match_uri("content://com.example.bookstore/books/3"),
            UriMatch::Unmatched
        );
    }

    #[test]
    fn content_types_distinguish_list_and_item() {
        let router = router();
        assert_eq!(
            router.content_type(Target::Collection),
            "vnd.cursor.dir/com.example.bookstore/books"
        );
        assert_eq!(
            router.content_type(Target::Item(1)),
            "vnd.cursor.item/com.example.bookstore/books"
        );
    }
}
