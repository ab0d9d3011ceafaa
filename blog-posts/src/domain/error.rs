use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("post not found for slug: {0}")]
    SlugNotFound(String),
    #[error("slug already exists: {0}")]
    SlugConflict(String),
    #[error("author not found: {0}")]
    AuthorNotFound(i64),
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error("storage error: {0}")]
    Storage(String),
}
