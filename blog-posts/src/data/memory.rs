//! In-process stores backing the repository traits. Used by tests and by
//! embedders that have no database. Clones share the same tables.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::data::author_repository::AuthorRepository;
use crate::data::post_repository::{PostFilter, PostRepository};
use crate::domain::author::Author;
use crate::domain::category::{Category, PostCategory};
use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Default)]
struct PostTables {
    posts: Vec<Post>,
    categories: Vec<Category>,
    links: Vec<PostCategory>,
    last_post_id: i64,
    last_category_id: i64,
}

impl PostTables {
    fn slug_taken(&self, slug: &str, except_id: i64) -> bool {
        self.posts.iter().any(|p| p.slug == slug && p.id != except_id)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPostRepository {
    tables: Arc<RwLock<PostTables>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn link_count(&self, post_id: i64) -> usize {
        let tables = self.tables.read().await;
        tables.links.iter().filter(|l| l.post_id == post_id).count()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn insert(&self, mut post: Post) -> Result<Post, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&post.slug, 0) {
            return Err(DomainError::SlugConflict(post.slug));
        }

        tables.last_post_id += 1;
        post.id = tables.last_post_id;
        tables.posts.push(post.clone());

        info!(post_id = post.id, slug = %post.slug, "post created");
        Ok(post)
    }

    async fn update_content(&self, post: &Post) -> Result<Option<Post>, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&post.slug, post.id) {
            return Err(DomainError::SlugConflict(post.slug.clone()));
        }

        Ok(tables.posts.iter_mut().find(|p| p.id == post.id).map(|stored| {
            stored.slug = post.slug.clone();
            stored.title = post.title.clone();
            stored.description = post.description.clone();
            stored.content = post.content.clone();
            stored.cover = post.cover.clone();
            stored.post_type = post.post_type;
            stored.published_at = post.published_at;
            stored.clone()
        }))
    }

    async fn set_published(
        &self,
        id: i64,
        published_at: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError> {
        let mut tables = self.tables.write().await;
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|stored| {
            stored.published_at = published_at;
            stored.clone()
        }))
    }

    async fn set_featured(&self, id: i64, featured: bool) -> Result<Option<Post>, DomainError> {
        let mut tables = self.tables.write().await;
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|stored| {
            stored.is_featured = featured;
            stored.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables.posts.iter().position(|p| p.id == id) else {
            return Ok(false);
        };

        tables.posts.remove(index);
        tables.links.retain(|l| l.post_id != id);
        Ok(true)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        filter.sort(&mut posts);
        Ok(posts)
    }

    async fn slugs_with_prefix(
        &self,
        prefix: &str,
        exclude_id: Option<i64>,
    ) -> Result<HashSet<String>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|p| p.slug.starts_with(prefix) && Some(p.id) != exclude_id)
            .map(|p| p.slug.clone())
            .collect())
    }

    async fn categories_for(
        &self,
        post_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Category>>, DomainError> {
        let tables = self.tables.read().await;
        let mut categories: HashMap<i64, Vec<Category>> = HashMap::new();

        for link in tables.links.iter().filter(|l| post_ids.contains(&l.post_id)) {
            if let Some(category) = tables.categories.iter().find(|c| c.id == link.category_id) {
                categories
                    .entry(link.post_id)
                    .or_default()
                    .push(category.clone());
            }
        }
        for list in categories.values_mut() {
            list.sort_by(|a, b| a.content.cmp(&b.content));
        }
        Ok(categories)
    }

    async fn set_categories(
        &self,
        post_id: i64,
        labels: &[String],
    ) -> Result<Vec<Category>, DomainError> {
        let mut tables = self.tables.write().await;
        tables.links.retain(|l| l.post_id != post_id);

        let mut saved = Vec::with_capacity(labels.len());
        for label in labels {
            let existing = tables.categories.iter().find(|c| c.matches(label)).cloned();
            let category = match existing {
                Some(category) => category,
                None => {
                    tables.last_category_id += 1;
                    let category = Category {
                        id: tables.last_category_id,
                        content: label.clone(),
                    };
                    tables.categories.push(category.clone());
                    category
                }
            };

            let link = PostCategory {
                post_id,
                category_id: category.id,
            };
            if !tables.links.contains(&link) {
                tables.links.push(link);
            }
            saved.push(category);
        }

        info!(post_id, count = saved.len(), "post categories saved");
        Ok(saved)
    }

    async fn increment_views(&self, id: i64) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        match tables.posts.iter_mut().find(|p| p.id == id) {
            Some(post) => {
                post.views = post.views.saturating_add(1);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAuthorRepository {
    authors: Arc<RwLock<Vec<Author>>>,
}

impl InMemoryAuthorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorRepository for InMemoryAuthorRepository {
    async fn create(&self, mut author: Author) -> Result<Author, DomainError> {
        let mut authors = self.authors.write().await;
        if authors.iter().any(|a| a.email == author.email) {
            return Err(DomainError::EmailTaken(author.email));
        }

        author.id = authors.last().map_or(1, |a| a.id + 1);
        authors.push(author.clone());

        info!(author_id = author.id, email = %author.email, "author created");
        Ok(author)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, DomainError> {
        let authors = self.authors.read().await;
        Ok(authors.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>, DomainError> {
        let authors = self.authors.read().await;
        Ok(authors
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str) -> Post {
        Post::new(1, slug.to_string(), slug.to_string(), String::new())
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let repo = InMemoryPostRepository::new();

        let first = repo.insert(post("a")).await.unwrap();
        let second = repo.insert(post("b")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_slug() {
        let repo = InMemoryPostRepository::new();
        repo.insert(post("same")).await.unwrap();

        let err = repo.insert(post("same")).await.unwrap_err();

        assert!(matches!(err, DomainError::SlugConflict(slug) if slug == "same"));
    }

    #[tokio::test]
    async fn update_unknown_id_reports_none() {
        let repo = InMemoryPostRepository::new();
        let mut ghost = post("ghost");
        ghost.id = 99;

        assert!(repo.update_content(&ghost).await.unwrap().is_none());
        assert!(repo.set_featured(99, true).await.unwrap().is_none());
        assert!(repo.set_published(99, Utc::now()).await.unwrap().is_none());
        assert!(repo.find_by_slug("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn narrow_writes_leave_other_columns_alone() {
        let repo = InMemoryPostRepository::new();
        let stored = repo.insert(post("narrow")).await.unwrap();
        repo.increment_views(stored.id).await.unwrap();
        repo.set_featured(stored.id, true).await.unwrap();

        let mut stale = stored.clone();
        stale.title = "Renamed".into();
        stale.rating = 4.5;
        let updated = repo.update_content(&stale).await.unwrap().unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.views, 1);
        assert!(updated.is_featured);
        assert_eq!(updated.rating, stored.rating);

        let published = repo.set_published(stored.id, Utc::now()).await.unwrap().unwrap();
        assert!(published.is_published());
        assert_eq!(published.title, "Renamed");
        assert_eq!(published.views, 1);
    }

    #[tokio::test]
    async fn delete_cascades_links() {
        let repo = InMemoryPostRepository::new();
        let stored = repo.insert(post("linked")).await.unwrap();
        repo.set_categories(stored.id, &["Rust".into(), "Web".into()])
            .await
            .unwrap();
        assert_eq!(repo.link_count(stored.id).await, 2);

        assert!(repo.delete(stored.id).await.unwrap());

        assert_eq!(repo.link_count(stored.id).await, 0);
        assert!(!repo.delete(stored.id).await.unwrap());
    }

    #[tokio::test]
    async fn categories_are_reused_case_insensitively() {
        let repo = InMemoryPostRepository::new();
        let a = repo.insert(post("a")).await.unwrap();
        let b = repo.insert(post("b")).await.unwrap();

        let first = repo.set_categories(a.id, &["Rust".into()]).await.unwrap();
        let second = repo.set_categories(b.id, &["rust".into()]).await.unwrap();

        assert_eq!(first[0].id, second[0].id);
        assert_eq!(second[0].content, "Rust");

        let map = repo.categories_for(&[a.id, b.id]).await.unwrap();
        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn slugs_with_prefix_honours_exclusion() {
        let repo = InMemoryPostRepository::new();
        let own = repo.insert(post("hello")).await.unwrap();
        repo.insert(post("hello2")).await.unwrap();
        repo.insert(post("other")).await.unwrap();

        let all = repo.slugs_with_prefix("hello", None).await.unwrap();
        let others = repo.slugs_with_prefix("hello", Some(own.id)).await.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(others.len(), 1);
        assert!(others.contains("hello2"));
    }

    #[tokio::test]
    async fn list_filters_published() {
        let repo = InMemoryPostRepository::new();
        let mut live = post("live");
        live.published_at = Utc::now();
        repo.insert(live).await.unwrap();
        repo.insert(post("draft")).await.unwrap();

        let published = repo.list(&PostFilter::published()).await.unwrap();
        let drafts = repo.list(&PostFilter::drafts()).await.unwrap();

        assert_eq!(published.len(), 1);
        assert_eq!(published[0].slug, "live");
        assert_eq!(drafts[0].slug, "draft");
    }

    #[tokio::test]
    async fn author_email_is_unique() {
        let repo = InMemoryAuthorRepository::new();
        repo.create(Author::new("Ann".into(), "ann@example.com".into(), false))
            .await
            .unwrap();

        let err = repo
            .create(Author::new("Ann Two".into(), "ann@example.com".into(), false))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::EmailTaken(_)));
    }
}
