use chrono::Days;

use super::super::domain::DonationType;

/// Minimum days between two donations, keyed by the type being requested.
pub const fn minimum_interval_days(donation_type: DonationType) -> u32 {
    match donation_type {
        DonationType::WholeBlood => 56,
        DonationType::Plasma => 28,
        DonationType::Platelets => 2,
    }
}

pub(crate) fn minimum_interval(donation_type: DonationType) -> Days {
    Days::new(u64::from(minimum_interval_days(donation_type)))
}
