//! A user's search as a named, cacheable subset of the catalog.

use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::catalog::PhotoSet;
use crate::model::user::UserContext;

use super::expression::Expression;

/// Cache key of the unfiltered query.
const ALL_PHOTOS_KEY: &str = "all";

/// An optional expression plus the user it is evaluated for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionQuery {
    pub expr: Option<Expression>,
    pub user: UserContext,
}

impl CollectionQuery {
    pub fn new(expr: Option<Expression>, user: UserContext) -> Self {
        Self { expr, user }
    }

    /// Narrow `base` to this query's photos.
    ///
    /// Without an expression every published photo matches, whoever is
    /// looking; unpublished photos only surface through a query. Collection
    /// expressions use exact matching, anything else searches. Photos with
    /// no year are always dropped since they cannot be ordered.
    pub fn filter<'a>(&self, base: &PhotoSet<'a>) -> PhotoSet<'a> {
        let matched = match &self.expr {
            None => base.filter(|photo| photo.is_published),
            Some(expr) => match expr.as_collection(base, &self.user) {
                Ok(set) => set,
                Err(_) => expr.as_search(base, &self.user),
            },
        };
        matched.filter(|photo| photo.year.is_some())
    }

    /// Stable key identifying the query's result set.
    pub fn cache_encoding(&self) -> String {
        match &self.expr {
            None => ALL_PHOTOS_KEY.to_string(),
            Some(expr) => {
                let digest = Sha256::digest(expr.canonical().as_bytes());
                digest.iter().map(|b| format!("{b:02x}")).collect()
            }
        }
    }
}

impl fmt::Display for CollectionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expr {
            None => f.write_str("All Photos"),
            Some(expr) => write!(f, "{}", expr.description()),
        }
    }
}

/// LRU cache of ordered result ids.
///
/// Keyed by [`CollectionQuery::cache_encoding`] together with the user,
/// since visibility rules change what a query returns. Meant to be held by
/// a long-lived caller serving many queries over one catalog; a single
/// CLI invocation runs one query and filters directly.
pub struct ResultCache {
    entries: LruCache<(String, UserContext), Vec<u64>>,
}

impl ResultCache {
    /// A cache holding up to `capacity` result lists (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Ordered ids of `query` over `base`, computed on a miss.
    pub fn ordered_ids(&mut self, query: &CollectionQuery, base: &PhotoSet<'_>) -> &[u64] {
        let key = (query.cache_encoding(), query.user.clone());
        if !self.entries.contains(&key) {
            debug!(key = %key.0, "Result cache miss");
            let ids = query.filter(base).ordered_ids();
            self.entries.put(key.clone(), ids);
        }
        self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::model::photo::Photo;
    use crate::model::tag::PhotoTag;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Photo {
                id: 1,
                year: Some(1912),
                is_published: true,
                tags: vec![PhotoTag::accepted("dog")],
                ..Photo::default()
            },
            Photo {
                id: 2,
                year: None,
                is_published: true,
                tags: vec![PhotoTag::accepted("dog")],
                ..Photo::default()
            },
            Photo {
                id: 3,
                year: Some(1905),
                is_published: false,
                tags: vec![PhotoTag::accepted("dog")],
                ..Photo::default()
            },
            Photo {
                id: 4,
                year: Some(1900),
                is_published: true,
                caption: "dog".into(),
                ..Photo::default()
            },
        ])
    }

    #[test]
    fn test_no_expression_means_all_published_dated() {
        let catalog = catalog();
        let query = CollectionQuery::default();
        assert_eq!(query.filter(&catalog.all()).ordered_ids(), vec![4, 1]);
        assert_eq!(query.to_string(), "All Photos");
        assert_eq!(query.cache_encoding(), "all");
    }

    #[test]
    fn test_no_expression_hides_unpublished_from_staff() {
        let catalog = catalog();
        let staff = UserContext {
            user_id: Some(1),
            can_view_unpublished: true,
            can_review_tags: true,
        };
        let query = CollectionQuery::new(None, staff);
        assert_eq!(query.filter(&catalog.all()).ordered_ids(), vec![4, 1]);
    }

    #[test]
    fn test_collection_uses_exact_matching() {
        let catalog = catalog();
        let query = CollectionQuery::new(
            Some(Expression::TagExactly("dog".into())),
            UserContext::anonymous(),
        );
        assert_eq!(query.filter(&catalog.all()).ordered_ids(), vec![1]);
        assert_eq!(query.to_string(), "tagged with dog");
    }

    #[test]
    fn test_search_fallback_for_non_collections() {
        let catalog = catalog();
        let expr = Expression::Tag("dog".into()) | Expression::Caption("dog".into());
        let query = CollectionQuery::new(Some(expr), UserContext::anonymous());
        assert_eq!(query.filter(&catalog.all()).ordered_ids(), vec![4, 1]);
    }

    #[test]
    fn test_cache_encoding_is_stable_hex() {
        let a = CollectionQuery::new(Some(Expression::Tag("dog".into())), UserContext::anonymous());
        let b = CollectionQuery::new(Some(Expression::Tag("dog".into())), UserContext::user(3));
        let c = CollectionQuery::new(Some(Expression::Tag("cat".into())), UserContext::anonymous());
        assert_eq!(a.cache_encoding().len(), 64);
        assert!(a.cache_encoding().chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(a.cache_encoding(), b.cache_encoding());
        assert_ne!(a.cache_encoding(), c.cache_encoding());
    }

    #[test]
    fn test_result_cache_reuses_entries() {
        let catalog = catalog();
        let mut cache = ResultCache::new(2);
        let query = CollectionQuery::default();
        assert_eq!(cache.ordered_ids(&query, &catalog.all()), &[4, 1]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.ordered_ids(&query, &catalog.all()), &[4, 1]);
        assert_eq!(cache.len(), 1);

        for tag in ["a", "b", "c"] {
            let q = CollectionQuery::new(Some(Expression::Tag(tag.into())), UserContext::anonymous());
            cache.ordered_ids(&q, &catalog.all());
        }
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
