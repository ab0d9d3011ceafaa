pub mod author_repository;
pub mod memory;
pub mod post_repository;
