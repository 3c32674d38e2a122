//! `ampere-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod docnum;
pub mod entity;
pub mod error;
pub mod gst;
pub mod id;
pub mod money;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use gst::{gst_breakdown, GstBreakdown, GST_RATE_PERCENT};
pub use id::{ClientId, ProjectId, QuotationId, VendorId};
pub use money::Money;
