//! Shared Kernel
//!
//! The error vocabulary every crate agrees on: [`error::app_error::AppError`],
//! its HTTP classification, and (with the `axum` feature) the problem-details
//! response it renders to.
//!
//! Subsystem-specific errors live in their own crates and convert into
//! `AppError` at the HTTP boundary.

pub mod error {
    pub mod app_error;
    pub mod kind;

    #[cfg(feature = "axum")]
    mod response;
}
