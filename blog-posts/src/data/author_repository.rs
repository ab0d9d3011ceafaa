use crate::domain::author::Author;
use crate::domain::error::DomainError;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn create(&self, author: Author) -> Result<Author, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, DomainError>;
    /// Bulk lookup. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresAuthorRepository {
    pool: PgPool,
}

impl PostgresAuthorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorRepository for PostgresAuthorRepository {
    async fn create(&self, author: Author) -> Result<Author, DomainError> {
        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (display_name, avatar, email, is_admin, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, display_name, avatar, email, is_admin, created_at
            "#,
        )
        .bind(&author.display_name)
        .bind(&author.avatar)
        .bind(&author.email)
        .bind(author.is_admin)
        .bind(author.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create author: {}", e);
            if e.as_database_error()
                .and_then(|db| db.constraint())
                .map(|c| c.contains("authors_email"))
                == Some(true)
            {
                DomainError::EmailTaken(author.email.clone())
            } else {
                DomainError::Storage(format!("database error: {}", e))
            }
        })?;

        info!(author_id = author.id, email = %author.email, "author created");
        Ok(author)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, DomainError> {
        sqlx::query_as::<_, Author>(
            r#"
            SELECT id, display_name, avatar, email, is_admin, created_at
            FROM authors
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to find author by id {}: {}", id, e);
            DomainError::Storage(format!("database error: {}", e))
        })
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Author>(
            r#"
            SELECT id, display_name, avatar, email, is_admin, created_at
            FROM authors
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to load authors: {}", e);
            DomainError::Storage(format!("database error: {}", e))
        })
    }
}
