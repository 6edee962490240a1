//! # Data Model
//!
//! Item references, sized items and the partition plan that orders them.
//!
//! An [`ItemRef`] enters through the manifest reader, becomes a [`SizedItem`]
//! after a successful probe, lands in exactly one [`Group`] of a
//! [`PartitionPlan`] and is serialized once by the manifest writer.

pub mod item;
pub mod plan;

pub use item::{ItemRef, SizedItem};
pub use plan::{Group, PartitionPlan, PlanSummary};
