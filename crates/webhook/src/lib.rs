//! `webhook` crate: the `WebhookClient` trait and its implementations.
//!
//! The engine and the API layer reach the external workflow webhook only
//! through [`WebhookClient`], so tests can swap in [`mock::MockWebhook`].

pub mod error;
pub mod traits;
pub mod http;
pub mod mock;

pub use error::WebhookError;
pub use http::{HttpWebhookClient, WEBHOOK_TIMEOUT};
pub use traits::{AssetRequest, WebhookClient, WebhookResponse};
