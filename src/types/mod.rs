pub mod admin;
pub mod forms;
pub mod pagination;
pub mod query;
pub mod views;
