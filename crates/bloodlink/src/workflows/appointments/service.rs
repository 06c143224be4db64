use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::access::{AccessDenied, IdentityError, Requester, Role};
use super::clock::Clock;
use super::domain::{
    AppointmentId, AppointmentStatus, AppointmentView, BookingRequest, DonationHistoryEntry,
    DonationRecord, DonationType, HospitalSummary, UnknownAppointmentStatus, UnknownDonationType,
    UserId,
};
use super::eligibility::{self, EligibilityDecision, EligibilityError, LastDonation};
use super::lifecycle;
use super::repository::{AppointmentRepository, HospitalDirectory, RepositoryError};

/// Service gating bookings on donor eligibility and exposing role-scoped appointment views.
pub struct AppointmentService<R, H> {
    repository: Arc<R>,
    hospitals: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<R, H> AppointmentService<R, H>
where
    R: AppointmentRepository + 'static,
    H: HospitalDirectory + 'static,
{
    pub fn new(repository: Arc<R>, hospitals: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            hospitals,
            clock,
        }
    }

    /// Preview whether the donor could book `donation_type` today.
    pub fn eligibility(
        &self,
        requester: &Requester,
        donation_type: DonationType,
    ) -> Result<EligibilityDecision, BookingError> {
        let donor_id = requester.require(Role::Donor)?;
        self.decide(donor_id, donation_type, self.clock.today())
    }

    /// Book a new appointment for the requesting donor.
    ///
    /// Exactly one `Pending` record is written on success; nothing is written on rejection.
    pub fn book_appointment(
        &self,
        requester: &Requester,
        request: BookingRequest,
    ) -> Result<DonationRecord, BookingError> {
        let donor_id = requester.require(Role::Donor)?;
        let today = self.clock.today();

        if request.date < today {
            return Err(BookingError::InvalidArgument(format!(
                "appointment date {} is in the past (today is {today})",
                request.date
            )));
        }

        if self.hospitals.hospital(request.hospital_id)?.is_none() {
            return Err(BookingError::UnknownHospital(request.hospital_id));
        }

        let decision = self.decide(donor_id, request.donation_type, today)?;
        if let Some(next_eligible_date) = decision.next_eligible_date {
            warn!(
                donor = %donor_id,
                donation_type = request.donation_type.identifier(),
                %next_eligible_date,
                "booking rejected: donation interval not elapsed"
            );
            return Err(BookingError::NotEligible { next_eligible_date });
        }

        let record = DonationRecord {
            id: self.repository.next_id()?,
            donor_id,
            hospital_id: request.hospital_id,
            donation_type: request.donation_type,
            scheduled_date: request.date,
            scheduled_time: request.time,
            status: AppointmentStatus::Pending,
        };

        let stored = self.repository.insert(record)?;
        info!(
            appointment = %stored.id,
            donor = %donor_id,
            hospital = %stored.hospital_id,
            donation_type = stored.donation_type.identifier(),
            date = %stored.scheduled_date,
            "appointment booked"
        );
        Ok(stored)
    }

    /// Registered hospitals, optionally restricted to one city.
    pub fn hospitals(&self, city: Option<&str>) -> Result<Vec<HospitalSummary>, BookingError> {
        let city = city.map(str::trim).filter(|city| !city.is_empty());
        Ok(self.hospitals.hospitals(city)?)
    }

    /// Appointments visible to the requester, most recent first.
    pub fn list_appointments(
        &self,
        requester: &Requester,
    ) -> Result<Vec<AppointmentView>, BookingError> {
        let mut records = match requester.role {
            Role::Donor => self.repository.for_donor(requester.user_id)?,
            Role::Hospital => self.repository.for_hospital(requester.user_id)?,
            Role::Recipient => return Err(BookingError::ListingRestricted(requester.role)),
        };

        sort_most_recent_first(&mut records);
        let mut hospitals = HospitalCache::new(self.hospitals.as_ref());
        records
            .into_iter()
            .map(|record| hospitals.attach(record))
            .collect()
    }

    /// Closest pending or confirmed appointment from today onward.
    pub fn next_appointment(
        &self,
        requester: &Requester,
    ) -> Result<Option<AppointmentView>, BookingError> {
        let donor_id = requester.require(Role::Donor)?;
        let today = self.clock.today();

        let next = self
            .repository
            .for_donor(donor_id)?
            .into_iter()
            .filter(|record| record.status.is_upcoming() && record.scheduled_date >= today)
            .min_by_key(|record| (record.scheduled_date, record.scheduled_time));

        let mut hospitals = HospitalCache::new(self.hospitals.as_ref());
        next.map(|record| hospitals.attach(record)).transpose()
    }

    /// Completed donations for the requesting donor with the hospital name resolved.
    pub fn donation_history(
        &self,
        requester: &Requester,
    ) -> Result<Vec<DonationHistoryEntry>, BookingError> {
        let donor_id = requester.require(Role::Donor)?;

        let mut completed: Vec<DonationRecord> = self
            .repository
            .for_donor(donor_id)?
            .into_iter()
            .filter(|record| record.status.counts_toward_history())
            .collect();
        sort_most_recent_first(&mut completed);

        let mut hospitals = HospitalCache::new(self.hospitals.as_ref());
        let mut history = Vec::with_capacity(completed.len());
        for record in completed {
            let location = hospitals
                .resolve(record.hospital_id)?
                .map(|hospital| hospital.name);

            history.push(DonationHistoryEntry {
                id: record.id,
                donation_type: record.donation_type,
                date: record.scheduled_date,
                location,
            });
        }

        Ok(history)
    }

    /// Move an appointment at the requesting hospital to `status`.
    pub fn update_status(
        &self,
        requester: &Requester,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<DonationRecord, BookingError> {
        let hospital_id = requester.require(Role::Hospital)?;

        let mut record = self
            .repository
            .fetch(appointment_id)?
            .ok_or(BookingError::NotFound(appointment_id))?;

        if record.hospital_id != hospital_id {
            return Err(BookingError::ForeignAppointment(appointment_id));
        }

        if !lifecycle::can_transition(record.status, status) {
            return Err(BookingError::InvalidTransition {
                from: record.status,
                to: status,
            });
        }

        let previous = record.status;
        record.status = status;
        self.repository.update(record.clone())?;

        info!(
            appointment = %appointment_id,
            hospital = %hospital_id,
            from = previous.label(),
            to = status.label(),
            "appointment status updated"
        );
        Ok(record)
    }

    fn decide(
        &self,
        donor_id: UserId,
        donation_type: DonationType,
        today: NaiveDate,
    ) -> Result<EligibilityDecision, BookingError> {
        let last = self
            .repository
            .find_last_completed_donation(donor_id)?
            .map(|record| LastDonation::from(&record));

        Ok(eligibility::evaluate(donation_type, last.as_ref(), today)?)
    }
}

/// Per-call memo of directory lookups so each hospital is resolved once.
struct HospitalCache<'a, H> {
    directory: &'a H,
    resolved: BTreeMap<UserId, Option<HospitalSummary>>,
}

impl<'a, H: HospitalDirectory> HospitalCache<'a, H> {
    fn new(directory: &'a H) -> Self {
        Self {
            directory,
            resolved: BTreeMap::new(),
        }
    }

    fn resolve(&mut self, id: UserId) -> Result<Option<HospitalSummary>, RepositoryError> {
        if let Some(known) = self.resolved.get(&id) {
            return Ok(known.clone());
        }
        let hospital = self.directory.hospital(id)?;
        self.resolved.insert(id, hospital.clone());
        Ok(hospital)
    }

    fn attach(&mut self, record: DonationRecord) -> Result<AppointmentView, BookingError> {
        let hospital = self.resolve(record.hospital_id)?;
        Ok(AppointmentView { record, hospital })
    }
}

fn sort_most_recent_first(records: &mut [DonationRecord]) {
    records.sort_by(|a, b| {
        (b.scheduled_date, b.scheduled_time).cmp(&(a.scheduled_date, a.scheduled_time))
    });
}

/// Error raised by the appointment service.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("donor is not eligible before {next_eligible_date}")]
    NotEligible { next_eligible_date: NaiveDate },
    #[error(transparent)]
    Unauthenticated(#[from] IdentityError),
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error("appointment listings are available to donor and hospital accounts (caller is {0})")]
    ListingRestricted(Role),
    #[error("appointment {0} belongs to another hospital")]
    ForeignAppointment(AppointmentId),
    #[error("hospital {0} is not registered")]
    UnknownHospital(UserId),
    #[error("appointment {0} not found")]
    NotFound(AppointmentId),
    #[error("cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] RepositoryError),
}

impl From<EligibilityError> for BookingError {
    fn from(value: EligibilityError) -> Self {
        match value {
            EligibilityError::InvalidArgument(detail) => Self::InvalidArgument(detail),
        }
    }
}

impl From<UnknownDonationType> for BookingError {
    fn from(value: UnknownDonationType) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl From<UnknownAppointmentStatus> for BookingError {
    fn from(value: UnknownAppointmentStatus) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}
