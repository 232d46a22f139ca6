//! # Kitchen Sim Analytics
//!
//! Read-side queries over persisted [`OrderRecord`]s.
//!
//! An order's status at any instant follows from its three timestamps alone,
//! so the whole history can be rebuilt from the final rows:
//!
//! - Completed once `completed_at ≤ T`
//! - In Progress once `started_at ≤ T`
//! - Queued once `received_at ≤ T`
//! - not yet arrived before that
//!
//! The statuses are mutually exclusive at every instant.
//!
//! ## Example
//!
//! ```ignore
//! use kitchen_sim_analytics::{status_over_time, timing_summary};
//!
//! let records = sink.load_orders().await?;
//! for bucket in status_over_time(&records, Duration::from_secs(600))? {
//!     println!("{} {}", bucket.start, bucket.counts.queued);
//! }
//! ```
//!
//! [`OrderRecord`]: kitchen_sim_core::order::OrderRecord

pub mod status;
pub mod timeline;
pub mod timing;

pub use status::{StatusCounts, counts_at, orders_by_status, status_at};
pub use timeline::{StatusBucket, TimelineError, status_over_time};
pub use timing::{TimingSummary, timing_summary};
