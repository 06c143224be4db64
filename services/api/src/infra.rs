use bloodlink::workflows::appointments::{
    AppointmentId, AppointmentRepository, DonationRecord, DonationType, HospitalDirectory,
    HospitalSummary, RepositoryError, UserId,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAppointmentRepository {
    records: Arc<Mutex<HashMap<AppointmentId, DonationRecord>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryAppointmentRepository {
    fn matching<F>(&self, predicate: F) -> Vec<DonationRecord>
    where
        F: Fn(&DonationRecord) -> bool,
    {
        let guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }
}

impl AppointmentRepository for InMemoryAppointmentRepository {
    fn next_id(&self) -> Result<AppointmentId, RepositoryError> {
        Ok(AppointmentId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1))
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
        if guard.contains_key(&record.id) {
            guard.insert(record.id, record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
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
        Ok(self
            .matching(|record| {
                record.donor_id == donor_id && record.status.counts_toward_history()
            })
            .into_iter()
            .max_by_key(|record| (record.scheduled_date, record.id)))
    }

    fn for_donor(&self, donor_id: UserId) -> Result<Vec<DonationRecord>, RepositoryError> {
        Ok(self.matching(|record| record.donor_id == donor_id))
    }

    fn for_hospital(&self, hospital_id: UserId) -> Result<Vec<DonationRecord>, RepositoryError> {
        Ok(self.matching(|record| record.hospital_id == hospital_id))
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryHospitalDirectory {
    hospitals: Arc<RwLock<BTreeMap<UserId, HospitalSummary>>>,
}

impl InMemoryHospitalDirectory {
    pub(crate) fn register(&self, id: UserId, name: &str, city: &str) {
        let mut guard = self.hospitals.write().expect("directory lock poisoned");
        guard.insert(
            id,
            HospitalSummary {
                id,
                name: name.to_string(),
                city: city.to_string(),
            },
        );
    }

    pub(crate) fn seeded() -> Self {
        let directory = Self::default();
        for (id, name, city) in DEMO_HOSPITALS {
            directory.register(UserId(id), name, city);
        }
        directory
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.hospitals
            .read()
            .expect("directory lock poisoned")
            .is_empty()
    }
}

impl HospitalDirectory for InMemoryHospitalDirectory {
    fn hospital(&self, id: UserId) -> Result<Option<HospitalSummary>, RepositoryError> {
        let guard = self.hospitals.read().expect("directory lock poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn hospitals(&self, city: Option<&str>) -> Result<Vec<HospitalSummary>, RepositoryError> {
        let guard = self.hospitals.read().expect("directory lock poisoned");
        Ok(guard
            .values()
            .filter(|hospital| city.map_or(true, |city| hospital.is_in(city)))
            .cloned()
            .collect())
    }
}

pub(crate) const DEMO_HOSPITALS: [(u64, &str, &str); 3] = [
    (100, "Central Blood Center", "Lyon"),
    (101, "North General Hospital", "Lille"),
    (102, "University Hospital Transfusion Unit", "Lyon"),
];

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_donation_type(raw: &str) -> Result<DonationType, String> {
    raw.parse::<DonationType>().map_err(|err| {
        let accepted: Vec<&str> = DonationType::ALL
            .iter()
            .map(DonationType::identifier)
            .collect();
        format!("{err}; expected one of {}", accepted.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodlink::workflows::appointments::AppointmentStatus;
    use chrono::NaiveTime;

    fn record(id: u64, on: NaiveDate, status: AppointmentStatus) -> DonationRecord {
        DonationRecord {
            id: AppointmentId(id),
            donor_id: UserId(1),
            hospital_id: UserId(100),
            donation_type: DonationType::Plasma,
            scheduled_date: on,
            scheduled_time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            status,
        }
    }

    #[test]
    fn last_completed_lookup_ignores_other_statuses() {
        let repository = InMemoryAppointmentRepository::default();
        let early = parse_date("2026-01-01").expect("valid");
        let late = parse_date("2026-02-01").expect("valid");
        repository
            .insert(record(1, early, AppointmentStatus::Completed))
            .expect("insert");
        repository
            .insert(record(2, late, AppointmentStatus::Cancelled))
            .expect("insert");

        let last = repository
            .find_last_completed_donation(UserId(1))
            .expect("lookup")
            .expect("record present");
        assert_eq!(last.id, AppointmentId(1));
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let repository = InMemoryAppointmentRepository::default();
        let on = parse_date("2026-01-01").expect("valid");
        repository
            .insert(record(1, on, AppointmentStatus::Pending))
            .expect("insert");
        assert!(matches!(
            repository.insert(record(1, on, AppointmentStatus::Pending)),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn seeded_directory_resolves_demo_hospitals() {
        let directory = InMemoryHospitalDirectory::seeded();
        assert!(!directory.is_empty());
        for (id, _, _) in DEMO_HOSPITALS {
            assert!(directory.hospital(UserId(id)).expect("lookup").is_some());
        }
        assert!(InMemoryHospitalDirectory::default().is_empty());
        let hospital = directory
            .hospital(UserId(100))
            .expect("lookup")
            .expect("hospital present");
        assert_eq!(hospital.name, "Central Blood Center");
    }

    #[test]
    fn directory_listing_filters_by_city() {
        let directory = InMemoryHospitalDirectory::seeded();

        let everyone = directory.hospitals(None).expect("listing");
        let ids: Vec<u64> = everyone.iter().map(|hospital| hospital.id.0).collect();
        assert_eq!(ids, vec![100, 101, 102]);

        let lyon = directory.hospitals(Some(" lyon ")).expect("listing");
        let ids: Vec<u64> = lyon.iter().map(|hospital| hospital.id.0).collect();
        assert_eq!(ids, vec![100, 102]);

        assert!(directory
            .hospitals(Some("Marseille"))
            .expect("listing")
            .is_empty());
    }

    #[test]
    fn donation_type_errors_list_accepted_values() {
        let err = parse_donation_type("marrow").expect_err("rejected");
        assert!(err.contains("whole_blood, plasma, platelets"));
    }
}
