//! # roomcast-core
//!
//! Room-scoped presence and broadcast routing for the Roomcast server.
//!
//! This crate provides the stateful heart of the system:
//!
//! - **Membership** - which connections occupy which room, one room per
//!   connection, kept in lockstep with the per-connection registry
//! - **Directory** - the forest of known rooms and their display metadata
//! - **Router** - dispatches inbound named events and fans outbound events
//!   out to the right scope (room, all, all-but-sender, sender-only)
//! - **EventSink** - the one-way delivery capability the router is given,
//!   so routing stays independent of any concrete transport
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Connection │────▶│   Router    │────▶│  EventSink  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                        │        │
//!                        ▼        ▼
//!                 ┌────────────┐ ┌────────────┐
//!                 │ Membership │ │ Directory  │
//!                 └────────────┘ └────────────┘
//! ```

pub mod directory;
pub mod membership;
pub mod router;
pub mod sink;

pub use directory::{Directory, DirectoryError};
pub use membership::Membership;
pub use router::{Router, RouterStats, UNKNOWN_USER};
pub use sink::{ConnectionId, EventSink};
