pub mod add;
pub mod delete;
pub mod get;
pub mod message;
pub mod update;
