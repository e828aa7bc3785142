pub mod sentiment;
pub mod summary;
