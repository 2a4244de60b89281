//! Remote data gateway for the outlay workspace.
//!
//! Everything that talks to the remote service lives here, behind explicit,
//! injected clients (no ambient global handle):
//!
//! - [`gateway::DataGateway`] - typed per-collection fetch/upsert/delete,
//!   owner attribution and currency defaulting
//! - [`auth::AuthClient`] - sign-up/in/out, persisted session, and
//!   session-changed callbacks with unsubscribe handles
//! - [`receipts::ReceiptStore`] - path-based receipt upload with
//!   collision-avoiding names
//! - [`feed::ChangeFeed`] - polling change detection that triggers
//!   registered callbacks when a collection changes remotely
//!
//! Every failure surfaces as a [`Fault`](outlay_types::Fault) value; nothing
//! in this crate panics on network conditions.

pub mod auth;
pub mod config;
pub mod feed;
pub mod gateway;
pub mod receipts;
pub mod rest;

pub use auth::{AuthClient, Session, SessionEvent, SessionStore, SessionSubscription};
pub use config::GatewayConfig;
pub use feed::{ChangeEvent, ChangeFeed, FeedHandle};
pub use gateway::DataGateway;
pub use receipts::ReceiptStore;
pub use rest::RestClient;
