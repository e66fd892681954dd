#![deny(clippy::all, clippy::pedantic)]

pub mod browse;
pub mod posts;
pub mod seo;
pub mod tags;
pub mod uploads;
