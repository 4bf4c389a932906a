#![forbid(unsafe_code)]

//! Core: dataset, snapshots, host events, and the presentation-surface contract.
//!
//! # Role in scrollfeed
//! `scrollfeed-core` owns the immutable data model. It knows nothing about
//! scheduling or pagination policy; those live in `scrollfeed-runtime` and
//! `scrollfeed-pager`. Everything here is plain data plus the
//! [`PresentationSurface`] trait that hosts implement.

pub mod config;
pub mod dataset;
pub mod error;
pub mod event;
pub mod index_path;
pub mod snapshot;
pub mod surface;

pub use config::{ConfigError, FeedConfig, FeedConfigParse};
pub use dataset::{Dataset, Item, Section, build_initial_dataset};
pub use error::{FeedError, FeedResult};
pub use event::Event;
pub use index_path::IndexPath;
pub use snapshot::{ListState, Snapshot};
pub use surface::{PresentationSurface, SurfaceError};
