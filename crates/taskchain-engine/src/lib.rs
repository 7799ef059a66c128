//! # Taskchain Engine
//!
//! The reconciliation engine: everything between the raw ledger gateway
//! and a presentation layer.
//!
//! The read path runs Ledger → [`normalize`] → [`Reconstructor`] →
//! [`ViewStateStore`]; write intents run through the
//! [`MutationCoordinator`]'s simulate → submit → confirm lifecycle and
//! finish with one more read-path pass so the caller observes its own
//! write. [`TaskBoard`] ties the two paths together and is the only
//! surface a presentation layer consumes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskchain_engine::TaskBoard;
//!
//! let board = TaskBoard::new(Arc::new(ledger), session);
//! board.reload().await?;
//! board.create("buy milk").await?;
//! let snapshot = board.snapshot().await; // includes the new task
//! ```

pub mod board;
pub mod coordinator;
pub mod normalize;
pub mod reconstruct;
pub mod store;

pub use board::TaskBoard;
pub use coordinator::{MutationCoordinator, WriteIntent, WritePhase};
pub use normalize::normalize;
pub use reconstruct::Reconstructor;
pub use store::{Snapshot, ViewStateStore};
