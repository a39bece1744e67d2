//! Account service and session client for the MathLeap learning app.
//!
//! The server side (`auth`, `users`, `tutor`) is an axum application built by
//! [`app::build_app`]; the client side lives in [`client`].

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod state;
pub mod tutor;
pub mod users;
pub mod validation;
