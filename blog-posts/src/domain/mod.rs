pub mod author;
pub mod category;
pub mod error;
pub mod pager;
pub mod post;
