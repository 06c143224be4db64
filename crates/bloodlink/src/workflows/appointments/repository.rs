use super::domain::{AppointmentId, DonationRecord, HospitalSummary, UserId};

/// Storage abstraction for appointments so the service can be exercised in isolation.
pub trait AppointmentRepository: Send + Sync {
    /// Allocate an identifier for a record about to be inserted.
    fn next_id(&self) -> Result<AppointmentId, RepositoryError>;
    fn insert(&self, record: DonationRecord) -> Result<DonationRecord, RepositoryError>;
    fn update(&self, record: DonationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: AppointmentId) -> Result<Option<DonationRecord>, RepositoryError>;
    /// Most recent completed donation by scheduled date, of any donation type.
    fn find_last_completed_donation(
        &self,
        donor_id: UserId,
    ) -> Result<Option<DonationRecord>, RepositoryError>;
    fn for_donor(&self, donor_id: UserId) -> Result<Vec<DonationRecord>, RepositoryError>;
    fn for_hospital(&self, hospital_id: UserId) -> Result<Vec<DonationRecord>, RepositoryError>;
}

/// Read-only lookup of registered hospitals.
pub trait HospitalDirectory: Send + Sync {
    fn hospital(&self, id: UserId) -> Result<Option<HospitalSummary>, RepositoryError>;
    /// Registered hospitals ordered by id, restricted to `city` when given.
    fn hospitals(&self, city: Option<&str>) -> Result<Vec<HospitalSummary>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
