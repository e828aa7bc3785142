pub mod news;
pub mod trade;
pub mod user;
