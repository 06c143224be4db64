use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Identifier of a registered user (donor, recipient, or hospital account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a booked appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(pub u64);

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of donation a donor can book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationType {
    WholeBlood,
    Plasma,
    Platelets,
}

impl DonationType {
    pub const ALL: [DonationType; 3] = [
        DonationType::WholeBlood,
        DonationType::Plasma,
        DonationType::Platelets,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DonationType::WholeBlood => "Whole Blood",
            DonationType::Plasma => "Plasma",
            DonationType::Platelets => "Platelets",
        }
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            DonationType::WholeBlood => "whole_blood",
            DonationType::Plasma => "plasma",
            DonationType::Platelets => "platelets",
        }
    }
}

impl fmt::Display for DonationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized donation type '{0}'")]
pub struct UnknownDonationType(pub String);

impl FromStr for DonationType {
    type Err = UnknownDonationType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "wholeblood" => Ok(DonationType::WholeBlood),
            "plasma" => Ok(DonationType::Plasma),
            "platelets" => Ok(DonationType::Platelets),
            _ => Err(UnknownDonationType(raw.to_string())),
        }
    }
}

/// Appointment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    /// Only completed donations count toward eligibility history.
    pub fn counts_toward_history(&self) -> bool {
        matches!(self, AppointmentStatus::Completed)
    }

    pub fn is_upcoming(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized appointment status '{0}'")]
pub struct UnknownAppointmentStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownAppointmentStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(UnknownAppointmentStatus(raw.to_string())),
        }
    }
}

/// A historical or upcoming appointment owned by one donor at one hospital.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRecord {
    pub id: AppointmentId,
    pub donor_id: UserId,
    pub hospital_id: UserId,
    pub donation_type: DonationType,
    pub scheduled_date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub scheduled_time: NaiveTime,
    pub status: AppointmentStatus,
}

/// Validated booking request for the authenticated donor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub hospital_id: UserId,
    pub donation_type: DonationType,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Facility details resolved from the hospital directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalSummary {
    pub id: UserId,
    pub name: String,
    pub city: String,
}

impl HospitalSummary {
    /// Case-insensitive city match, ignoring surrounding whitespace.
    pub fn is_in(&self, city: &str) -> bool {
        self.city.trim().eq_ignore_ascii_case(city.trim())
    }
}

/// Appointment as returned to callers, with the hospital details attached when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub record: DonationRecord,
    pub hospital: Option<HospitalSummary>,
}

/// Completed donation as shown in a donor's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationHistoryEntry {
    pub id: AppointmentId,
    pub donation_type: DonationType,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|err| format!("failed to parse '{raw}' as HH:MM ({err})"))
}

pub(crate) mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}
