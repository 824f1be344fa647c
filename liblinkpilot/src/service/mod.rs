//! Workflow services behind the publishing session
//!
//! `session` owns the state machine; `auth`, `assets`, and `publisher` are
//! the server-side steps its transitions invoke. Each of them talks to the
//! platform only through the `Platform` trait.

pub mod assets;
pub mod auth;
pub mod publisher;
pub mod session;
