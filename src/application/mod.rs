//! Application services layer.

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod listings;
pub mod passwords;
pub mod repos;
