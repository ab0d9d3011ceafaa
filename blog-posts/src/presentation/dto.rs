use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::author::Author;
use crate::domain::category::Category;
use crate::domain::post::{Post, PostType};

/// Replaces author emails in sanitized summaries.
pub const SANITIZED_EMAIL: &str = "donotreply@us.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub display_name: String,
    pub avatar: String,
    pub email: String,
    pub is_admin: bool,
}

impl AuthorSummary {
    pub fn from_author(author: &Author, sanitize: bool) -> Self {
        let avatar = match author.avatar.as_deref() {
            Some(avatar) if !avatar.trim().is_empty() => avatar.to_string(),
            _ => default_avatar(&author.display_name),
        };
        let email = if sanitize {
            SANITIZED_EMAIL.to_string()
        } else {
            author.email.clone()
        };

        Self {
            id: author.id,
            display_name: author.display_name.clone(),
            avatar,
            email,
            is_admin: author.is_admin,
        }
    }
}

/// SVG data URI showing the uppercased first character of the name.
pub fn default_avatar(display_name: &str) -> String {
    let initial: String = display_name
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string());

    format!(
        "data:image/svg+xml;utf8,<svg xmlns='http://www.w3.org/2000/svg' width='64' height='64'>\
         <rect width='64' height='64' fill='%23cfd8dc'/>\
         <text x='32' y='42' font-size='32' text-anchor='middle' fill='%23ffffff'>{initial}</text></svg>"
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostItemSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub cover: String,
    pub post_type: PostType,
    pub published: bool,
    pub published_at: DateTime<Utc>,
    pub featured: bool,
    pub views: i64,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub author: Option<AuthorSummary>,
    pub categories: Vec<String>,
}

impl PostItemSummary {
    pub fn assemble(
        post: Post,
        author: Option<&Author>,
        categories: &[Category],
        sanitize: bool,
    ) -> Self {
        Self {
            id: post.id,
            published: post.is_published(),
            slug: post.slug,
            title: post.title,
            description: post.description,
            content: post.content,
            cover: post.cover,
            post_type: post.post_type,
            published_at: post.published_at,
            featured: post.is_featured,
            views: post.views,
            rating: post.rating,
            created_at: post.created_at,
            author: author.map(|a| AuthorSummary::from_author(a, sanitize)),
            categories: categories.iter().map(|c| c.content.clone()).collect(),
        }
    }
}

/// A single published post with its feed neighbours and related posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostModel {
    pub post: PostItemSummary,
    pub older: Option<PostItemSummary>,
    pub newer: Option<PostItemSummary>,
    pub related: Vec<PostItemSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(avatar: Option<&str>) -> Author {
        let mut author = Author::new("ada lovelace".into(), "ada@example.com".into(), true);
        author.id = 5;
        author.avatar = avatar.map(str::to_string);
        author
    }

    #[test]
    fn sanitize_masks_email() {
        let summary = AuthorSummary::from_author(&author(None), true);
        assert_eq!(summary.email, SANITIZED_EMAIL);

        let summary = AuthorSummary::from_author(&author(None), false);
        assert_eq!(summary.email, "ada@example.com");
    }

    #[test]
    fn missing_avatar_gets_initial_placeholder() {
        let summary = AuthorSummary::from_author(&author(None), false);

        assert!(summary.avatar.starts_with("data:image/svg+xml"));
        assert!(summary.avatar.contains(">A</text>"));
    }

    #[test]
    fn existing_avatar_is_kept() {
        let summary = AuthorSummary::from_author(&author(Some("img/ada.png")), false);
        assert_eq!(summary.avatar, "img/ada.png");
    }

    #[test]
    fn empty_name_placeholder() {
        assert!(default_avatar("  ").contains(">?</text>"));
    }

    #[test]
    fn summary_flattens_post() {
        let mut post = Post::new(5, "intro".into(), "Intro".into(), "<p>x</p>".into());
        post.id = 9;
        let categories = vec![Category {
            id: 1,
            content: "Rust".into(),
        }];

        let summary = PostItemSummary::assemble(post, Some(&author(None)), &categories, true);

        assert_eq!(summary.id, 9);
        assert!(!summary.published);
        assert_eq!(summary.categories, vec!["Rust"]);
        assert_eq!(summary.author.map(|a| a.id), Some(5));
    }
}
