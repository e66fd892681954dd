//! Application services layer.

pub mod admin;
pub mod error;
pub mod listing;
pub mod pagination;
pub mod repos;
pub mod seo;
pub mod site;
pub mod sitemap;
pub mod uploads;
