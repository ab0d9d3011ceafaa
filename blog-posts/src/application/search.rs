//! Keyword ranking over an in-memory candidate list.
//!
//! Each whitespace-separated sub-term of the lower-cased query adds:
//!
//! * 10 for every category whose label equals the sub-term,
//! * 10 per occurrence in the title,
//! * 3 per occurrence in the description,
//! * 1 per occurrence in the content.
//!
//! Sub-terms shorter than [`MIN_COMPOUNDING_TERM_LEN`] are ignored once the
//! post already has a positive rank.

use std::collections::HashMap;

use crate::domain::category::Category;
use crate::domain::post::Post;

/// Query that lists every stored post without ranking.
pub const SEARCH_ALL: &str = "*";

pub const MIN_COMPOUNDING_TERM_LEN: usize = 4;

const CATEGORY_WEIGHT: usize = 10;
const TITLE_WEIGHT: usize = 10;
const DESCRIPTION_WEIGHT: usize = 3;
const CONTENT_WEIGHT: usize = 1;

pub fn split_terms(term: &str) -> Vec<String> {
    term.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub fn rank(post: &Post, categories: &[Category], terms: &[String]) -> usize {
    let title = post.title.to_lowercase();
    let description = post.description.to_lowercase();
    let content = post.content.to_lowercase();
    let mut rank = 0;

    for term in terms {
        if term.is_empty() {
            continue;
        }
        if rank > 0 && term.chars().count() < MIN_COMPOUNDING_TERM_LEN {
            continue;
        }

        rank += categories.iter().filter(|c| c.matches(term)).count() * CATEGORY_WEIGHT;
        rank += title.matches(term.as_str()).count() * TITLE_WEIGHT;
        rank += description.matches(term.as_str()).count() * DESCRIPTION_WEIGHT;
        rank += content.matches(term.as_str()).count() * CONTENT_WEIGHT;
    }

    rank
}

/// Ranks `candidates` against `term`, drops the ones that score zero and
/// orders the rest by rank, highest first. Equal ranks keep candidate order.
pub fn rank_posts(
    candidates: Vec<Post>,
    categories: &HashMap<i64, Vec<Category>>,
    term: &str,
) -> Vec<(Post, usize)> {
    let terms = split_terms(term);

    let mut ranked: Vec<(Post, usize)> = candidates
        .into_iter()
        .filter_map(|post| {
            let post_categories = categories.get(&post.id).map(Vec::as_slice).unwrap_or(&[]);
            let score = rank(&post, post_categories, &terms);
            (score > 0).then_some((post, score))
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}
