//! Post management for a blog: storage of posts, authors and categories,
//! slug generation, publish and feature toggles, paginated listings and a
//! keyword search with weighted ranking.

pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::filter::{IncludeMask, ListFilter, PublishedStatus};
pub use application::post_service::PostService;
pub use domain::error::DomainError;
pub use domain::pager::Pager;
pub use domain::post::{Post, PostType};
pub use presentation::dto::{PostItemSummary, PostModel};
