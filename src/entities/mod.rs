//! Database entities

pub mod issue;
pub mod issue_item;
pub mod product;
pub mod restock;
pub mod user;
