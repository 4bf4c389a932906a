#![forbid(unsafe_code)]

//! Pagination for scrollfeed.
//!
//! - [`PaginationController`] owns the cursor and the in-flight guard and
//!   runs the commit protocol: build snapshot → apply after a delay →
//!   completion.
//! - [`FeedApp`] is the runtime [`Model`](scrollfeed_runtime::Model) that
//!   connects the controller to a presentation surface and schedules
//!   delayed commits as background tasks.

pub mod app;
pub mod controller;

pub use app::{FeedApp, FeedMsg};
pub use controller::{CommitId, CommitOutcome, PaginationController, PendingCommit};
