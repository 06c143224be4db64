use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Outcome of an eligibility check for one requested donation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityDecision {
    pub eligible: bool,
    pub next_eligible_date: Option<NaiveDate>,
    pub reason: EligibilityReason,
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EligibilityReason {
    FirstDonation,
    IntervalElapsed {
        last_donation_date: NaiveDate,
        required_interval_days: u32,
    },
    IntervalNotElapsed {
        last_donation_date: NaiveDate,
        required_interval_days: u32,
        days_remaining: i64,
    },
}

impl EligibilityDecision {
    pub fn summary(&self) -> String {
        match (&self.reason, self.next_eligible_date) {
            (EligibilityReason::FirstDonation, _) => {
                "eligible: no completed donation on record".to_string()
            }
            (
                EligibilityReason::IntervalElapsed {
                    last_donation_date,
                    required_interval_days,
                },
                _,
            ) => format!(
                "eligible: {required_interval_days}-day interval since {} has elapsed",
                last_donation_date.format(DISPLAY_DATE_FORMAT)
            ),
            (EligibilityReason::IntervalNotElapsed { .. }, Some(date)) => {
                not_eligible_message(date)
            }
            (EligibilityReason::IntervalNotElapsed { days_remaining, .. }, None) => {
                format!("not eligible for another {days_remaining} day(s)")
            }
        }
    }
}

pub fn not_eligible_message(next_eligible_date: NaiveDate) -> String {
    format!(
        "Sorry, you cannot donate yet. Your next eligible date for this donation type is {}.",
        next_eligible_date.format(DISPLAY_DATE_FORMAT)
    )
}
