//! LinkedIn publishing client.
//!
//! Covers the three remote capabilities the publish sweep needs: OAuth token
//! refresh, two-step media upload (initialize + PUT bytes), and post
//! creation with single- or multi-asset content. Wire details beyond those
//! contracts are out of scope; every call returns a typed
//! [`LinkedinError`] on failure.

mod client;
mod error;
mod types;

pub use client::LinkedinClient;
pub use error::LinkedinError;
pub use types::RefreshedToken;
