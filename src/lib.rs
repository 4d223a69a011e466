pub mod api;
pub mod core;
pub mod explain;
pub mod inference;
