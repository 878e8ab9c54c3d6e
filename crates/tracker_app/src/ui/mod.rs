pub mod presentation;
pub mod render;
