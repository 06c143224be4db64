//! Donor eligibility: decides whether the requested donation type may be booked on a given
//! day, based on the donor's most recent completed donation.
//!
//! The most recent completed donation is taken regardless of its type, and the interval of
//! the *requested* type is applied to it. Donors are not tracked per donation type.

mod intervals;
mod policy;

pub use intervals::minimum_interval_days;
pub use policy::{not_eligible_message, EligibilityDecision, EligibilityReason};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{DonationRecord, DonationType};

/// The part of a completed donation the evaluator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastDonation {
    pub date: NaiveDate,
    pub donation_type: DonationType,
}

impl From<&DonationRecord> for LastDonation {
    fn from(record: &DonationRecord) -> Self {
        Self {
            date: record.scheduled_date,
            donation_type: record.donation_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Decide whether `requested` can be booked on `today`.
///
/// Eligibility is inclusive of the computed date: a donor whose interval ends today may book.
pub fn evaluate(
    requested: DonationType,
    last_completed: Option<&LastDonation>,
    today: NaiveDate,
) -> Result<EligibilityDecision, EligibilityError> {
    let Some(last) = last_completed else {
        return Ok(EligibilityDecision {
            eligible: true,
            next_eligible_date: None,
            reason: EligibilityReason::FirstDonation,
        });
    };

    let required_interval_days = minimum_interval_days(requested);
    let eligible_date = last
        .date
        .checked_add_days(intervals::minimum_interval(requested))
        .ok_or_else(|| {
            EligibilityError::InvalidArgument(format!(
                "last donation date {} plus {required_interval_days} days is out of range",
                last.date
            ))
        })?;

    if today >= eligible_date {
        return Ok(EligibilityDecision {
            eligible: true,
            next_eligible_date: None,
            reason: EligibilityReason::IntervalElapsed {
                last_donation_date: last.date,
                required_interval_days,
            },
        });
    }

    Ok(EligibilityDecision {
        eligible: false,
        next_eligible_date: Some(eligible_date),
        reason: EligibilityReason::IntervalNotElapsed {
            last_donation_date: last.date,
            required_interval_days,
            days_remaining: (eligible_date - today).num_days(),
        },
    })
}
