use std::sync::Arc;

use tracing::instrument;

use crate::data::author_repository::AuthorRepository;
use crate::domain::{author::Author, error::DomainError};

#[derive(Clone)]
pub struct AuthorService<R: AuthorRepository + 'static> {
    repo: Arc<R>,
}

impl<R> AuthorService<R>
where
    R: AuthorRepository + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn get_author(&self, id: i64) -> Result<Author, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::AuthorNotFound(id))
    }

    #[instrument(skip(self, avatar))]
    pub async fn create_author(
        &self,
        display_name: String,
        email: String,
        is_admin: bool,
        avatar: Option<String>,
    ) -> Result<Author, DomainError> {
        let mut author = Author::new(display_name.trim().to_string(), email.to_lowercase(), is_admin);
        author.avatar = avatar.filter(|a| !a.trim().is_empty());
        self.repo.create(author).await
    }
}
