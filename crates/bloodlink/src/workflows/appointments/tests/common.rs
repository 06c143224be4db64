use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::HeaderValue;
use axum::response::Response;
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use crate::workflows::appointments::access::{USER_ID_HEADER, USER_ROLE_HEADER};
use crate::workflows::appointments::clock::FixedClock;
use crate::workflows::appointments::domain::{
    AppointmentId, AppointmentStatus, BookingRequest, DonationRecord, DonationType,
    HospitalSummary, UserId,
};
use crate::workflows::appointments::repository::{
    AppointmentRepository, HospitalDirectory, RepositoryError,
};
use crate::workflows::appointments::service::AppointmentService;

pub(super) const DONOR: UserId = UserId(10);
pub(super) const OTHER_DONOR: UserId = UserId(11);
pub(super) const HOSPITAL: UserId = UserId(100);
pub(super) const OTHER_HOSPITAL: UserId = UserId(101);

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn record(
    id: u64,
    donor_id: UserId,
    donation_type: DonationType,
    scheduled_date: NaiveDate,
    status: AppointmentStatus,
) -> DonationRecord {
    DonationRecord {
        id: AppointmentId(id),
        donor_id,
        hospital_id: HOSPITAL,
        donation_type,
        scheduled_date,
        scheduled_time: time(9, 30),
        status,
    }
}

pub(super) fn booking(donation_type: DonationType, on: NaiveDate) -> BookingRequest {
    BookingRequest {
        hospital_id: HOSPITAL,
        donation_type,
        date: on,
        time: time(10, 0),
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<BTreeMap<AppointmentId, DonationRecord>>,
    sequence: AtomicU64,
}

impl MemoryRepository {
    pub(super) fn with_records(records: Vec<DonationRecord>) -> Self {
        let repository = Self::default();
        let highest = records.iter().map(|record| record.id.0).max().unwrap_or(0);
        repository.sequence.store(highest, Ordering::SeqCst);
        {
            let mut guard = repository.records.lock().expect("repository mutex poisoned");
            for record in records {
                guard.insert(record.id, record);
            }
        }
        repository
    }

    pub(super) fn all(&self) -> Vec<DonationRecord> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}

impl AppointmentRepository for MemoryRepository {
    fn next_id(&self) -> Result<AppointmentId, RepositoryError> {
        Ok(AppointmentId(self.sequence.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn insert(&self, record: DonationRecord) -> Result<DonationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: DonationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: AppointmentId) -> Result<Option<DonationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn find_last_completed_donation(
        &self,
        donor_id: UserId,
    ) -> Result<Option<DonationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| {
                record.donor_id == donor_id && record.status == AppointmentStatus::Completed
            })
            .max_by_key(|record| record.scheduled_date)
            .cloned())
    }

    fn for_donor(&self, donor_id: UserId) -> Result<Vec<DonationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.donor_id == donor_id)
            .cloned()
            .collect())
    }

    fn for_hospital(&self, hospital_id: UserId) -> Result<Vec<DonationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.hospital_id == hospital_id)
            .cloned()
            .collect())
    }
}

pub(super) struct MemoryHospitals {
    hospitals: BTreeMap<UserId, HospitalSummary>,
}

impl Default for MemoryHospitals {
    fn default() -> Self {
        let mut hospitals = BTreeMap::new();
        for (id, name, city) in [
            (HOSPITAL, "Central Blood Center", "Lyon"),
            (OTHER_HOSPITAL, "North General Hospital", "Lille"),
        ] {
            hospitals.insert(
                id,
                HospitalSummary {
                    id,
                    name: name.to_string(),
                    city: city.to_string(),
                },
            );
        }
        Self { hospitals }
    }
}

impl HospitalDirectory for MemoryHospitals {
    fn hospital(&self, id: UserId) -> Result<Option<HospitalSummary>, RepositoryError> {
        Ok(self.hospitals.get(&id).cloned())
    }

    fn hospitals(&self, city: Option<&str>) -> Result<Vec<HospitalSummary>, RepositoryError> {
        Ok(self
            .hospitals
            .values()
            .filter(|hospital| city.map_or(true, |city| hospital.is_in(city)))
            .cloned()
            .collect())
    }
}

/// Reads succeed with an empty history; every write fails.
pub(super) struct UnavailableRepository;

impl AppointmentRepository for UnavailableRepository {
    fn next_id(&self) -> Result<AppointmentId, RepositoryError> {
        Ok(AppointmentId(1))
    }

    fn insert(&self, _record: DonationRecord) -> Result<DonationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("primary offline".to_string()))
    }

    fn update(&self, _record: DonationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("primary offline".to_string()))
    }

    fn fetch(&self, _id: AppointmentId) -> Result<Option<DonationRecord>, RepositoryError> {
        Ok(None)
    }

    fn find_last_completed_donation(
        &self,
        _donor_id: UserId,
    ) -> Result<Option<DonationRecord>, RepositoryError> {
        Ok(None)
    }

    fn for_donor(&self, _donor_id: UserId) -> Result<Vec<DonationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("replica offline".to_string()))
    }

    fn for_hospital(&self, _hospital_id: UserId) -> Result<Vec<DonationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("replica offline".to_string()))
    }
}

pub(super) type TestService = AppointmentService<MemoryRepository, MemoryHospitals>;

pub(super) fn build_service(
    today: NaiveDate,
    records: Vec<DonationRecord>,
) -> (TestService, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::with_records(records));
    let service = AppointmentService::new(
        repository.clone(),
        Arc::new(MemoryHospitals::default()),
        Arc::new(FixedClock(today)),
    );
    (service, repository)
}

pub(super) fn identity_headers(user_id: UserId, role: &'static str) -> axum::http::HeaderMap {
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(
        USER_ID_HEADER,
        HeaderValue::from_str(&user_id.0.to_string()).expect("numeric header"),
    );
    headers.insert(USER_ROLE_HEADER, HeaderValue::from_static(role));
    headers
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
