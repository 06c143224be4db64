//! Donation appointments: eligibility gating, booking, role-scoped views, and the hospital-driven
//! status lifecycle.

pub mod access;
pub mod clock;
pub mod domain;
pub mod eligibility;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use access::{AccessDenied, IdentityError, Requester, Role};
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    AppointmentId, AppointmentStatus, AppointmentView, BookingRequest, DonationHistoryEntry,
    DonationRecord, DonationType, HospitalSummary, UnknownDonationType, UserId,
};
pub use eligibility::{
    evaluate, EligibilityDecision, EligibilityError, EligibilityReason, LastDonation,
};
pub use repository::{AppointmentRepository, HospitalDirectory, RepositoryError};
pub use router::{appointment_router, ApiEnvelope, BookingPayload, HospitalQuery};
pub use service::{AppointmentService, BookingError};
