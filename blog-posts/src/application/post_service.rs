use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::application::filter::{IncludeMask, ListFilter, PublishedStatus};
use crate::application::sanitize::sanitize_html;
use crate::application::search::{self, SEARCH_ALL};
use crate::application::slug::{base_slug, resolve_slug};
use crate::data::author_repository::AuthorRepository;
use crate::data::post_repository::{PostFilter, PostOrder, PostRepository};
use crate::domain::author::Author;
use crate::domain::category::Category;
use crate::domain::error::DomainError;
use crate::domain::pager::Pager;
use crate::domain::post::{Post, PostType, UNPUBLISHED};
use crate::presentation::dto::{PostItemSummary, PostModel};

#[derive(Clone)]
pub struct PostService<P: PostRepository + 'static, A: AuthorRepository + 'static> {
    posts: Arc<P>,
    authors: Arc<A>,
}

impl<P, A> PostService<P, A>
where
    P: PostRepository + 'static,
    A: AuthorRepository + 'static,
{
    pub fn new(posts: Arc<P>, authors: Arc<A>) -> Self {
        Self { posts, authors }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        self.posts.find_by_id(id).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, DomainError> {
        self.posts.find_by_slug(slug).await
    }

    /// Slug for `title` that no post other than `exclude_id` uses. Falls
    /// back to the bare slug when every numbered variant is taken.
    pub async fn generate_slug(
        &self,
        title: &str,
        exclude_id: Option<i64>,
    ) -> Result<String, DomainError> {
        let base = base_slug(title);
        let taken = self.posts.slugs_with_prefix(&base, exclude_id).await?;

        Ok(resolve_slug(&base, &taken).unwrap_or_else(|| {
            warn!(slug = %base, "no free numbered slug left, reusing base slug");
            base
        }))
    }

    #[instrument(skip(self, post), fields(slug = %post.slug))]
    pub async fn add(&self, mut post: Post) -> Result<Post, DomainError> {
        if self.posts.find_by_slug(&post.slug).await?.is_some() {
            warn!("slug already in use");
            return Err(DomainError::SlugConflict(post.slug));
        }

        post.description = sanitize_html(&post.description);
        post.content = sanitize_html(&post.content);
        post.created_at = Utc::now();

        self.posts.insert(post).await
    }

    /// Rewrites the editable fields of the post with the same slug. Author,
    /// categories, views and the featured flag are left as stored.
    #[instrument(skip(self, post), fields(slug = %post.slug))]
    pub async fn update(&self, mut post: Post) -> Result<Post, DomainError> {
        post.id = self
            .posts
            .find_by_slug(&post.slug)
            .await?
            .ok_or_else(|| DomainError::SlugNotFound(post.slug.clone()))?
            .id;
        post.description = sanitize_html(&post.description);
        post.content = sanitize_html(&post.content);

        let updated = self
            .posts
            .update_content(&post)
            .await?
            .ok_or(DomainError::PostNotFound(post.id))?;

        info!(post_id = updated.id, "post updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn publish(&self, id: i64, publish: bool) -> Result<Post, DomainError> {
        let published_at = if publish { Utc::now() } else { *UNPUBLISHED };
        let post = self
            .posts
            .set_published(id, published_at)
            .await?
            .ok_or(DomainError::PostNotFound(id))?;

        info!(post_id = id, published = post.is_published(), "post state changed");
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn featured(&self, id: i64, featured: bool) -> Result<Post, DomainError> {
        let post = self
            .posts
            .set_featured(id, featured)
            .await?
            .ok_or(DomainError::PostNotFound(id))?;

        info!(post_id = id, featured, "post state changed");
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> Result<(), DomainError> {
        if !self.posts.delete(id).await? {
            return Err(DomainError::PostNotFound(id));
        }

        info!(post_id = id, "post deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn increment_views(&self, id: i64) -> Result<(), DomainError> {
        if !self.posts.increment_views(id).await? {
            return Err(DomainError::PostNotFound(id));
        }
        Ok(())
    }

    /// Replaces the post's categories. Blank labels are dropped and labels
    /// differing only in case are saved once.
    #[instrument(skip(self, labels))]
    pub async fn save_categories(
        &self,
        id: i64,
        labels: &[String],
    ) -> Result<Vec<Category>, DomainError> {
        self.require(id).await?;

        let mut unique: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
            if !unique.iter().any(|u| u.to_lowercase() == label.to_lowercase()) {
                unique.push(label.to_string());
            }
        }

        self.posts.set_categories(id, &unique).await
    }

    pub async fn get_posts(
        &self,
        status: PublishedStatus,
        post_type: PostType,
    ) -> Result<Vec<Post>, DomainError> {
        let filter = match status {
            PublishedStatus::Published => PostFilter::published().ordered(PostOrder::PublishedDesc),
            PublishedStatus::Drafts => PostFilter::drafts().ordered(PostOrder::IdDesc),
            PublishedStatus::Featured => PostFilter::default()
                .featured(true)
                .ordered(PostOrder::IdDesc),
            PublishedStatus::All => PostFilter::default().ordered(PostOrder::IdDesc),
        };

        self.posts.list(&filter.of_type(post_type)).await
    }

    /// Drafts in storage order, followed by the published buckets merged and
    /// sorted newest first.
    pub async fn get_filtered_set(
        &self,
        include: IncludeMask,
        author_id: Option<i64>,
    ) -> Result<Vec<Post>, DomainError> {
        let mut posts = if include.drafts {
            self.posts
                .list(&PostFilter::drafts().by_author(author_id))
                .await?
        } else {
            Vec::new()
        };

        let mut published = Vec::new();
        if include.featured {
            published.extend(
                self.posts
                    .list(&PostFilter::published().featured(true).by_author(author_id))
                    .await?,
            );
        }
        if include.published {
            published.extend(
                self.posts
                    .list(&PostFilter::published().featured(false).by_author(author_id))
                    .await?,
            );
        }
        published.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        posts.extend(published);
        Ok(posts)
    }

    pub async fn get_list(
        &self,
        pager: &mut Pager,
        filter: &ListFilter,
    ) -> Result<Vec<PostItemSummary>, DomainError> {
        let candidates = self
            .get_filtered_set(filter.include, filter.author_id)
            .await?;
        let ids: Vec<i64> = candidates.iter().map(|p| p.id).collect();
        let categories = self.posts.categories_for(&ids).await?;

        let posts: Vec<Post> = match filter.category.as_deref() {
            Some(label) => candidates
                .into_iter()
                .filter(|p| {
                    categories
                        .get(&p.id)
                        .is_some_and(|list| list.iter().any(|c| c.matches(label)))
                })
                .collect(),
            None => candidates,
        };

        let page = pager.window(posts);
        self.assemble_with(page, &categories, filter.sanitize).await
    }

    pub async fn get_popular(
        &self,
        pager: &mut Pager,
        author_id: Option<i64>,
    ) -> Result<Vec<PostItemSummary>, DomainError> {
        let posts = self
            .posts
            .list(
                &PostFilter::published()
                    .of_type(PostType::Post)
                    .by_author(author_id)
                    .ordered(PostOrder::ViewsDesc),
            )
            .await?;

        let page = pager.window(posts);
        self.assemble(page, true).await
    }

    /// Ranked keyword search. The literal `*` returns every stored post,
    /// unranked and unsanitized.
    pub async fn search(
        &self,
        pager: &mut Pager,
        term: &str,
        filter: &ListFilter,
    ) -> Result<Vec<PostItemSummary>, DomainError> {
        if term == SEARCH_ALL {
            let posts = self.posts.list(&PostFilter::default()).await?;
            let page = pager.window(posts);
            return self.assemble(page, false).await;
        }

        let candidates = self
            .get_filtered_set(filter.include, filter.author_id)
            .await?;
        let ids: Vec<i64> = candidates.iter().map(|p| p.id).collect();
        let categories = self.posts.categories_for(&ids).await?;

        let ranked: Vec<Post> = search::rank_posts(candidates, &categories, term)
            .into_iter()
            .map(|(post, _)| post)
            .collect();

        let page = pager.window(ranked);
        self.assemble_with(page, &categories, filter.sanitize).await
    }

    /// Public view of a published post. Counts a view, and attaches the
    /// neighbouring posts of the same type and up to `related` posts found
    /// by searching its title. All summaries are sanitized.
    pub async fn get_post_model(
        &self,
        slug: &str,
        related: usize,
    ) -> Result<Option<PostModel>, DomainError> {
        let Some(mut post) = self.posts.find_by_slug(slug).await? else {
            return Ok(None);
        };
        if post.is_draft() {
            return Ok(None);
        }

        self.increment_views(post.id).await?;
        post.views = post.views.saturating_add(1);

        let feed = self
            .get_posts(PublishedStatus::Published, post.post_type)
            .await?;
        let position = feed.iter().position(|p| p.id == post.id);
        let newer_id = position
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| feed.get(i))
            .map(|p| p.id);
        let older_id = position.and_then(|i| feed.get(i + 1)).map(|p| p.id);

        let related = if related == 0 {
            Vec::new()
        } else {
            let mut pager = Pager::new(1, related.saturating_add(1));
            self.search(&mut pager, &post.title, &ListFilter::public())
                .await?
                .into_iter()
                .filter(|item| item.id != post.id)
                .take(related)
                .collect()
        };

        let post_id = post.id;
        let mut wanted = vec![post];
        wanted.extend(
            feed.into_iter()
                .filter(|p| Some(p.id) == newer_id || Some(p.id) == older_id),
        );
        let mut items: HashMap<i64, PostItemSummary> = self
            .assemble(wanted, true)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let Some(post) = items.remove(&post_id) else {
            return Ok(None);
        };
        let newer = newer_id.and_then(|id| items.remove(&id));
        let older = older_id.and_then(|id| items.remove(&id));

        Ok(Some(PostModel {
            post,
            older,
            newer,
            related,
        }))
    }

    async fn require(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    async fn assemble(
        &self,
        posts: Vec<Post>,
        sanitize: bool,
    ) -> Result<Vec<PostItemSummary>, DomainError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let categories = self.posts.categories_for(&ids).await?;
        self.assemble_with(posts, &categories, sanitize).await
    }

    async fn assemble_with(
        &self,
        posts: Vec<Post>,
        categories: &HashMap<i64, Vec<Category>>,
        sanitize: bool,
    ) -> Result<Vec<PostItemSummary>, DomainError> {
        let mut author_ids: Vec<i64> = posts.iter().map(|p| p.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<i64, Author> = self
            .authors
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        Ok(posts
            .into_iter()
            .map(|post| {
                let post_categories = categories.get(&post.id).map(Vec::as_slice).unwrap_or(&[]);
                let author = authors.get(&post.author_id);
                PostItemSummary::assemble(post, author, post_categories, sanitize)
            })
            .collect())
    }
}
