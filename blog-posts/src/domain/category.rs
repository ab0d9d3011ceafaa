use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub content: String,
}

impl Category {
    pub fn matches(&self, label: &str) -> bool {
        self.content.to_lowercase() == label.to_lowercase()
    }
}

/// Association row between a post and a category. Removed together with
/// the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCategory {
    pub post_id: i64,
    pub category_id: i64,
}
