//! HTTP layer for the push dashboard.
//!
//! A single axum route serves the form and handles its submissions; the page
//! markup lives in [`page`].

pub mod handler;
pub mod page;
