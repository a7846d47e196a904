//! Customer Segmentation Rules
//!
//! Pure classification of a customer from their note history and last
//! visit. Notes double as the activity record: a "checked in" note is a
//! visit, a note mentioning a complaint flags the customer.
//!
//! Two inactivity windows exist on purpose and are NOT interchangeable:
//! [`is_recently_active_90d`] drives the `is_active` flag on every
//! update, while [`is_inactive_365d`] is the creation-time default and
//! the inactive-customer listing predicate. Product has not decided
//! which one is the business rule, so both are kept separately named.

use shared::models::{ColorTag, CustomerNote};
use shared::util::DAY_MS;

/// Window for the `is_active` flag recomputed on every update
pub const ACTIVE_WINDOW_MS: i64 = 90 * DAY_MS;

/// Window for the inactive-customer listing and creation-time defaults
pub const INACTIVE_WINDOW_MS: i64 = 365 * DAY_MS;

/// "checked in" notes needed for VIP status
pub const VIP_VISIT_THRESHOLD: usize = 10;

/// Classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub color_tag: ColorTag,
    pub is_active: bool,
}

/// Derive `{color_tag, is_active}` from a customer's notes and last visit.
///
/// Rules, in strict priority order:
/// 1. no notes -> `color_tag` keeps its prior value;
/// 2. any complaint note -> `Complainer` (overrides the visit count);
/// 3. >= 10 "checked in" notes -> `Vip`, otherwise `New`;
/// 4. `is_active` is the 90-day recency of `last_visit` when present,
///    otherwise it keeps its prior value.
///
/// Never fails; absent or malformed input degrades to the priors.
pub fn classify(
    notes: &[CustomerNote],
    last_visit: Option<i64>,
    prior_tag: ColorTag,
    prior_active: bool,
    now: i64,
) -> Classification {
    let color_tag = if notes.is_empty() {
        prior_tag
    } else if has_complaint(notes) {
        ColorTag::Complainer
    } else if visit_count(notes) >= VIP_VISIT_THRESHOLD {
        ColorTag::Vip
    } else {
        ColorTag::New
    };

    let is_active = match last_visit {
        Some(ts) => is_recently_active_90d(ts, now),
        None => prior_active,
    };

    Classification {
        color_tag,
        is_active,
    }
}

/// A customer with any note mentioning a complaint is flagged.
/// "complain" is a substring of "complaint", so one check covers both.
fn has_complaint(notes: &[CustomerNote]) -> bool {
    notes
        .iter()
        .any(|n| n.content.to_lowercase().contains("complain"))
}

/// Count visits: notes whose content marks a check-in
fn visit_count(notes: &[CustomerNote]) -> usize {
    notes
        .iter()
        .filter(|n| n.content.to_lowercase().contains("checked in"))
        .count()
}

/// 90-day recency window used by the update/reconciliation path
pub fn is_recently_active_90d(last_visit: i64, now: i64) -> bool {
    now - last_visit < ACTIVE_WINDOW_MS
}

/// 365-day inactivity window used at creation time and by the
/// inactive-customer listing
pub fn is_inactive_365d(last_visit: i64, now: i64) -> bool {
    now - last_visit > INACTIVE_WINDOW_MS
}
