//! Listing order and category/tag indices.
//!
//! Every listing on the site, the home page included, uses one ordering:
//!
//! 1. pinned posts before unpinned posts
//! 2. newer `publish_date` first
//! 3. `slug` ascending to break ties
//!
//! Indices hold references into the post collection; they never own or copy
//! records, and they are rebuilt from scratch on every build.

use crate::model::PostRecord;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Label → posts carrying that label, each bucket in listing order.
pub type LabelIndex<'a> = BTreeMap<String, Vec<&'a PostRecord>>;

/// Total order used by every listing.
pub fn compare_posts(a: &PostRecord, b: &PostRecord) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| b.publish_date.cmp(&a.publish_date))
        .then_with(|| a.slug.cmp(&b.slug))
}

/// Sort references in place by [`compare_posts`].
pub fn sort_listing(posts: &mut [&PostRecord]) {
    posts.sort_by(|a, b| compare_posts(a, b));
}

/// The global listing plus category and tag buckets for one build.
#[derive(Debug, Default)]
pub struct SiteIndex<'a> {
    /// All posts in listing order.
    pub all: Vec<&'a PostRecord>,
    pub categories: LabelIndex<'a>,
    pub tags: LabelIndex<'a>,
}

impl<'a> SiteIndex<'a> {
    /// Build all indices in one pass over `posts`.
    ///
    /// The global listing is sorted first, so appending in that order leaves
    /// every bucket sorted as well.
    pub fn build(posts: &'a [PostRecord]) -> Self {
        let mut all: Vec<&PostRecord> = posts.iter().collect();
        sort_listing(&mut all);

        let mut categories = LabelIndex::new();
        let mut tags = LabelIndex::new();
        for &post in &all {
            if !post.category.is_empty() {
                categories
                    .entry(post.category.clone())
                    .or_default()
                    .push(post);
            }
            for tag in &post.tags {
                tags.entry(tag.clone()).or_default().push(post);
            }
        }

        Self {
            all,
            categories,
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::post;

    fn slugs(posts: &[&PostRecord]) -> Vec<String> {
        posts.iter().map(|p| p.slug.clone()).collect()
    }

    #[test]
    fn unpinned_posts_newest_first() {
        let posts = vec![
            post("dec-05", "2024-12-05"),
            post("dec-10", "2024-12-10"),
            post("dec-15", "2024-12-15"),
        ];
        let index = SiteIndex::build(&posts);
        assert_eq!(slugs(&index.all), vec!["dec-15", "dec-10", "dec-05"]);
    }

    #[test]
    fn pinned_post_comes_first() {
        let mut oldest = post("dec-05", "2024-12-05");
        oldest.pinned = true;
        let posts = vec![
            oldest,
            post("dec-10", "2024-12-10"),
            post("dec-15", "2024-12-15"),
        ];
        let index = SiteIndex::build(&posts);
        assert_eq!(slugs(&index.all), vec!["dec-05", "dec-15", "dec-10"]);
    }

    #[test]
    fn pinned_posts_sorted_by_date_among_themselves() {
        let mut a = post("a", "2024-01-01");
        let mut b = post("b", "2024-06-01");
        a.pinned = true;
        b.pinned = true;
        let posts = vec![a, post("c", "2025-01-01"), b];
        let index = SiteIndex::build(&posts);
        assert_eq!(slugs(&index.all), vec!["b", "a", "c"]);
    }

    #[test]
    fn same_date_ties_broken_by_slug() {
        let posts = vec![
            post("zeta", "2024-12-05"),
            post("alpha", "2024-12-05"),
            post("mid", "2024-12-05"),
        ];
        let index = SiteIndex::build(&posts);
        assert_eq!(slugs(&index.all), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn ordering_independent_of_input_order() {
        let mut forward = vec![
            post("a", "2024-12-05"),
            post("b", "2024-12-10"),
            post("c", "2024-12-10"),
        ];
        forward[0].pinned = true;
        let mut reversed = forward.clone();
        reversed.reverse();

        let one = slugs(&SiteIndex::build(&forward).all);
        let two = slugs(&SiteIndex::build(&reversed).all);
        assert_eq!(one, two);
    }

    #[test]
    fn tag_buckets_contain_exactly_tagged_posts() {
        let mut first = post("first", "2024-12-05");
        first.tags = vec!["a".into(), "b".into()];
        let mut second = post("second", "2024-12-10");
        second.tags = vec!["b".into()];
        let posts = vec![first, second, post("untagged", "2024-12-15")];

        let index = SiteIndex::build(&posts);
        assert_eq!(index.tags.len(), 2);
        assert_eq!(slugs(&index.tags["b"]), vec!["second", "first"]);
        assert_eq!(slugs(&index.tags["a"]), vec!["first"]);
    }

    #[test]
    fn every_post_appears_once_per_tag() {
        let mut p = post("p", "2024-12-05");
        p.tags = vec!["x".into(), "y".into(), "z".into()];
        let posts = vec![p, post("q", "2024-12-06")];
        let index = SiteIndex::build(&posts);

        let buckets_with_p: Vec<&String> = index
            .tags
            .iter()
            .filter(|(_, bucket)| bucket.iter().any(|r| r.slug == "p"))
            .map(|(label, _)| label)
            .collect();
        assert_eq!(buckets_with_p, vec!["x", "y", "z"]);
        for bucket in index.tags.values() {
            assert_eq!(bucket.iter().filter(|r| r.slug == "p").count(), 1);
        }
    }

    #[test]
    fn category_buckets_skip_empty_category() {
        let mut a = post("a", "2024-12-05");
        a.category = "Rust".into();
        let mut b = post("b", "2024-12-06");
        b.category = "Rust".into();
        let posts = vec![a, b, post("c", "2024-12-07")];

        let index = SiteIndex::build(&posts);
        assert_eq!(index.categories.keys().collect::<Vec<_>>(), vec!["Rust"]);
        assert_eq!(slugs(&index.categories["Rust"]), vec!["b", "a"]);
    }

    #[test]
    fn buckets_follow_pinned_rule() {
        let mut old = post("old", "2020-01-01");
        old.pinned = true;
        old.tags = vec!["t".into()];
        let mut new = post("new", "2024-01-01");
        new.tags = vec!["t".into()];
        let posts = vec![new, old];
        let index = SiteIndex::build(&posts);
        assert_eq!(slugs(&index.tags["t"]), vec!["old", "new"]);
    }

    #[test]
    fn empty_collection_yields_empty_indices() {
        let index = SiteIndex::build(&[]);
        assert!(index.all.is_empty());
        assert!(index.categories.is_empty());
        assert!(index.tags.is_empty());
    }

    #[test]
    fn index_references_the_owned_records() {
        let posts = vec![post("a", "2024-12-05")];
        let index = SiteIndex::build(&posts);
        assert!(std::ptr::eq(index.all[0], &posts[0]));
    }
}
