pub mod author_service;
pub mod filter;
pub mod post_service;
pub mod sanitize;
pub mod search;
pub mod slug;
