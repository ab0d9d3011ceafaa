use std::collections::{HashMap, HashSet};

use crate::domain::category::Category;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostType, UNPUBLISHED};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{error, info};

const POST_COLUMNS: &str = "id, author_id, slug, title, description, content, cover, post_type, \
     published_at, is_featured, views, rating, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    /// Storage order.
    #[default]
    IdAsc,
    IdDesc,
    PublishedDesc,
    ViewsDesc,
}

/// Predicate for [`PostRepository::list`]. `None` fields do not restrict.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub state: Option<PublishState>,
    pub featured: Option<bool>,
    pub post_type: Option<PostType>,
    pub author_id: Option<i64>,
    pub order: PostOrder,
}

impl PostFilter {
    pub fn drafts() -> Self {
        Self {
            state: Some(PublishState::Draft),
            ..Self::default()
        }
    }

    pub fn published() -> Self {
        Self {
            state: Some(PublishState::Published),
            ..Self::default()
        }
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = Some(featured);
        self
    }

    pub fn of_type(mut self, post_type: PostType) -> Self {
        self.post_type = Some(post_type);
        self
    }

    pub fn by_author(mut self, author_id: Option<i64>) -> Self {
        self.author_id = author_id;
        self
    }

    pub fn ordered(mut self, order: PostOrder) -> Self {
        self.order = order;
        self
    }

    pub fn matches(&self, post: &Post) -> bool {
        let state_ok = match self.state {
            Some(PublishState::Draft) => post.is_draft(),
            Some(PublishState::Published) => post.is_published(),
            None => true,
        };
        state_ok
            && self.featured.is_none_or(|f| post.is_featured == f)
            && self.post_type.is_none_or(|t| post.post_type == t)
            && self.author_id.is_none_or(|a| post.author_id == a)
    }

    /// Sorts `posts` in place. Ties keep their storage order.
    pub fn sort(&self, posts: &mut [Post]) {
        match self.order {
            PostOrder::IdAsc => posts.sort_by_key(|p| p.id),
            PostOrder::IdDesc => posts.sort_by(|a, b| b.id.cmp(&a.id)),
            PostOrder::PublishedDesc => posts.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
            PostOrder::ViewsDesc => posts.sort_by(|a, b| b.views.cmp(&a.views)),
        }
    }
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Stores a new post and returns it with its assigned id.
    async fn insert(&self, post: Post) -> Result<Post, DomainError>;
    /// Writes the editable columns of `post` (slug, title, description,
    /// content, cover, type, publish date) to the row with the same id and
    /// returns the stored post. Views, rating, author and the featured flag
    /// are not touched. `None` when there is no such row.
    async fn update_content(&self, post: &Post) -> Result<Option<Post>, DomainError>;
    async fn set_published(
        &self,
        id: i64,
        published_at: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError>;
    async fn set_featured(&self, id: i64, featured: bool) -> Result<Option<Post>, DomainError>;
    /// Deletes the post together with its category links.
    async fn delete(&self, id: i64) -> Result<bool, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, DomainError>;
    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError>;
    async fn slugs_with_prefix(
        &self,
        prefix: &str,
        exclude_id: Option<i64>,
    ) -> Result<HashSet<String>, DomainError>;
    /// Categories of each requested post, sorted by label. Posts without
    /// categories are absent from the map.
    async fn categories_for(
        &self,
        post_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Category>>, DomainError>;
    /// Replaces the post's category links, creating missing categories.
    async fn set_categories(
        &self,
        post_id: i64,
        labels: &[String],
    ) -> Result<Vec<Category>, DomainError>;
    async fn increment_views(&self, id: i64) -> Result<bool, DomainError>;
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    author_id: i64,
    slug: String,
    title: String,
    description: String,
    content: String,
    cover: String,
    post_type: i16,
    published_at: DateTime<Utc>,
    is_featured: bool,
    views: i64,
    rating: f64,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            content: row.content,
            cover: row.cover,
            post_type: PostType::from_code(row.post_type),
            published_at: row.published_at,
            is_featured: row.is_featured,
            views: row.views,
            rating: row.rating,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn write_error(e: sqlx::Error, slug: &str) -> DomainError {
    if e.as_database_error()
        .and_then(|db| db.constraint())
        .map(|c| c.contains("posts_slug"))
        == Some(true)
    {
        DomainError::SlugConflict(slug.to_string())
    } else {
        DomainError::Storage(format!("database error: {}", e))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn insert(&self, post: Post) -> Result<Post, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts (author_id, slug, title, description, content, cover, post_type,
                               published_at, is_featured, views, rating, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.author_id)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.content)
        .bind(&post.cover)
        .bind(post.post_type.code())
        .bind(post.published_at)
        .bind(post.is_featured)
        .bind(post.views)
        .bind(post.rating)
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post {}: {}", post.slug, e);
            write_error(e, &post.slug)
        })?;

        let post = Post::from(row);
        info!(post_id = post.id, slug = %post.slug, "post created");
        Ok(post)
    }

    async fn update_content(&self, post: &Post) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
            SET
                slug = $2,
                title = $3,
                description = $4,
                content = $5,
                cover = $6,
                post_type = $7,
                published_at = $8
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.content)
        .bind(&post.cover)
        .bind(post.post_type.code())
        .bind(post.published_at)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Post::from))
        .map_err(|e| {
            error!("failed to update post {}: {}", post.id, e);
            write_error(e, &post.slug)
        })
    }

    async fn set_published(
        &self,
        id: i64,
        published_at: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, PostRow>(&format!(
            "UPDATE posts SET published_at = $2 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(published_at)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Post::from))
        .map_err(|e| {
            error!("failed to set publish date of post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })
    }

    async fn set_featured(&self, id: i64, featured: bool) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, PostRow>(&format!(
            "UPDATE posts SET is_featured = $2 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(featured)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Post::from))
        .map_err(|e| {
            error!("failed to set featured flag of post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete post {}: {}", id, e);
                DomainError::Storage(e.to_string())
            })?;

        Ok(deleted.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, PostRow>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Post::from))
            .map_err(|e| {
                error!("db error find_by_id {}: {}", id, e);
                DomainError::Storage(e.to_string())
            })
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Post::from))
        .map_err(|e| {
            error!("db error find_by_slug {}: {}", slug, e);
            DomainError::Storage(e.to_string())
        })
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE TRUE"));

        match filter.state {
            Some(PublishState::Draft) => {
                query.push(" AND published_at = ").push_bind(*UNPUBLISHED);
            }
            Some(PublishState::Published) => {
                query.push(" AND published_at <> ").push_bind(*UNPUBLISHED);
            }
            None => {}
        }
        if let Some(featured) = filter.featured {
            query.push(" AND is_featured = ").push_bind(featured);
        }
        if let Some(post_type) = filter.post_type {
            query.push(" AND post_type = ").push_bind(post_type.code());
        }
        if let Some(author_id) = filter.author_id {
            query.push(" AND author_id = ").push_bind(author_id);
        }
        query.push(match filter.order {
            PostOrder::IdAsc => " ORDER BY id ASC",
            PostOrder::IdDesc => " ORDER BY id DESC",
            PostOrder::PublishedDesc => " ORDER BY published_at DESC, id ASC",
            PostOrder::ViewsDesc => " ORDER BY views DESC, id ASC",
        });

        let rows = query
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while listing posts: {}", e);
                DomainError::Storage(e.to_string())
            })?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn slugs_with_prefix(
        &self,
        prefix: &str,
        exclude_id: Option<i64>,
    ) -> Result<HashSet<String>, DomainError> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT slug FROM posts
            WHERE left(slug, char_length($1)) = $1
              AND ($2::BIGINT IS NULL OR id <> $2)
            "#,
        )
        .bind(prefix)
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while reading slugs for {}: {}", prefix, e);
            DomainError::Storage(e.to_string())
        })?;

        Ok(slugs.into_iter().collect())
    }

    async fn categories_for(
        &self,
        post_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Category>>, DomainError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, i64, String)> = sqlx::query_as(
            r#"
            SELECT pc.post_id, c.id, c.content
            FROM post_categories pc
            JOIN categories c ON c.id = pc.category_id
            WHERE pc.post_id = ANY($1)
            ORDER BY c.content
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while loading categories: {}", e);
            DomainError::Storage(e.to_string())
        })?;

        let mut categories: HashMap<i64, Vec<Category>> = HashMap::new();
        for (post_id, id, content) in rows {
            categories
                .entry(post_id)
                .or_default()
                .push(Category { id, content });
        }
        Ok(categories)
    }

    async fn set_categories(
        &self,
        post_id: i64,
        labels: &[String],
    ) -> Result<Vec<Category>, DomainError> {
        let storage = |e: sqlx::Error| {
            error!("failed to save categories for post {}: {}", post_id, e);
            DomainError::Storage(e.to_string())
        };

        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let mut saved = Vec::with_capacity(labels.len());
        for label in labels {
            let existing: Option<(i64, String)> = sqlx::query_as(
                "SELECT id, content FROM categories WHERE lower(content) = lower($1) LIMIT 1",
            )
            .bind(label)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?;

            let (id, content) = match existing {
                Some(category) => category,
                None => sqlx::query_as(
                    "INSERT INTO categories (content) VALUES ($1) RETURNING id, content",
                )
                .bind(label)
                .fetch_one(&mut *tx)
                .await
                .map_err(storage)?,
            };

            sqlx::query(
                r#"
                INSERT INTO post_categories (post_id, category_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(post_id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

            saved.push(Category { id, content });
        }

        tx.commit().await.map_err(storage)?;

        info!(post_id, count = saved.len(), "post categories saved");
        Ok(saved)
    }

    async fn increment_views(&self, id: i64) -> Result<bool, DomainError> {
        let updated = sqlx::query("UPDATE posts SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to count view for post {}: {}", id, e);
                DomainError::Storage(e.to_string())
            })?;

        Ok(updated.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post(id: i64, featured: bool, published: bool) -> Post {
        let mut post = Post::new(1, format!("post-{id}"), format!("Post {id}"), String::new());
        post.id = id;
        post.is_featured = featured;
        if published {
            post.published_at = Utc::now() + Duration::minutes(id);
        }
        post
    }

    #[test]
    fn filter_by_state_and_flag() {
        let draft = post(1, true, false);
        let live = post(2, true, true);

        assert!(PostFilter::drafts().matches(&draft));
        assert!(!PostFilter::drafts().matches(&live));
        assert!(PostFilter::published().featured(true).matches(&live));
        assert!(!PostFilter::published().featured(false).matches(&live));
        assert!(PostFilter::default().matches(&draft));
    }

    #[test]
    fn filter_by_author_and_type() {
        let mut page = post(3, false, true);
        page.post_type = PostType::Page;
        page.author_id = 7;

        assert!(PostFilter::default().of_type(PostType::Page).matches(&page));
        assert!(!PostFilter::default().of_type(PostType::Post).matches(&page));
        assert!(PostFilter::default().by_author(Some(7)).matches(&page));
        assert!(!PostFilter::default().by_author(Some(8)).matches(&page));
        assert!(PostFilter::default().by_author(None).matches(&page));
    }

    #[test]
    fn sort_orders() {
        let mut posts = vec![post(2, false, true), post(1, false, true), post(3, false, true)];

        PostFilter::default().ordered(PostOrder::IdDesc).sort(&mut posts);
        assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        PostFilter::default().sort(&mut posts);
        assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        PostFilter::default()
            .ordered(PostOrder::PublishedDesc)
            .sort(&mut posts);
        assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    }
}
