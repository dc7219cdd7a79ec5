//! Presentation layer: the read-only HTTP view

pub mod html;
pub mod http_view;

pub use http_view::{router, serve};
