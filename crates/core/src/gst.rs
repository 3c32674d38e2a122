//! Singapore GST derivation.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::money::Money;

/// Prevailing GST rate applied to taxable supplies, in percent.
pub const GST_RATE_PERCENT: u32 = 7;

/// GST and gross total derived from a net amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GstBreakdown {
    pub gst_amount: Money,
    pub total_amount: Money,
}

/// Derive GST at the prevailing rate, rounding half-up on cents.
pub fn gst_breakdown(net: Money) -> DomainResult<GstBreakdown> {
    let gst_amount = net
        .percent(GST_RATE_PERCENT)
        .ok_or_else(|| DomainError::invariant("gst amount overflows"))?;
    let total_amount = net
        .checked_add(gst_amount)
        .ok_or_else(|| DomainError::invariant("gross total overflows"))?;
    Ok(GstBreakdown {
        gst_amount,
        total_amount,
    })
}
