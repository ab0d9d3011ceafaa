use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Publish timestamp carried by every draft. Midnight of 0001-01-01 UTC,
/// which still fits in a PostgreSQL `TIMESTAMPTZ`.
pub static UNPUBLISHED: Lazy<DateTime<Utc>> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .expect("0001-01-01T00:00:00 is a valid date")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Post,
    Page,
}

impl PostType {
    pub fn code(self) -> i16 {
        match self {
            PostType::Post => 0,
            PostType::Page => 1,
        }
    }

    pub fn from_code(code: i16) -> Self {
        match code {
            1 => PostType::Page,
            _ => PostType::Post,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub cover: String,
    pub post_type: PostType,
    pub published_at: DateTime<Utc>,
    pub is_featured: bool,
    pub views: i64,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// A fresh unsaved draft. The id is assigned by the store on insert.
    pub fn new(author_id: i64, slug: String, title: String, content: String) -> Self {
        Self {
            id: 0,
            author_id,
            slug,
            title,
            description: String::new(),
            content,
            cover: String::new(),
            post_type: PostType::Post,
            published_at: *UNPUBLISHED,
            is_featured: false,
            views: 0,
            rating: 0.0,
            created_at: Utc::now(),
        }
    }

    pub fn is_published(&self) -> bool {
        self.published_at != *UNPUBLISHED
    }

    pub fn is_draft(&self) -> bool {
        !self.is_published()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_post_is_a_draft() {
        let post = Post::new(1, "hello".into(), "Hello".into(), String::new());

        assert!(post.is_draft());
        assert_eq!(post.published_at, *UNPUBLISHED);
        assert_eq!(post.post_type, PostType::Post);
    }

    #[test]
    fn post_type_codes_round_trip() {
        assert_eq!(PostType::from_code(PostType::Page.code()), PostType::Page);
        assert_eq!(PostType::from_code(PostType::Post.code()), PostType::Post);
        assert_eq!(PostType::from_code(42), PostType::Post);
    }
}
