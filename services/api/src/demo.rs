use crate::infra::{
    parse_date, parse_donation_type, InMemoryAppointmentRepository, InMemoryHospitalDirectory,
    DEMO_HOSPITALS,
};
use bloodlink::error::AppError;
use bloodlink::workflows::appointments::eligibility::minimum_interval_days;
use bloodlink::workflows::appointments::{
    evaluate, AppointmentId, AppointmentRepository, AppointmentService, AppointmentStatus,
    BookingError, BookingRequest, DonationRecord, DonationType, EligibilityError, FixedClock,
    LastDonation, Requester, UserId,
};
use chrono::{Days, Local, NaiveDate, NaiveTime};
use clap::Args;
use std::sync::Arc;

const DEMO_DONOR: UserId = UserId(1);

#[derive(Args, Debug)]
pub(crate) struct EligibilityCheckArgs {
    /// Donation type to book (whole_blood, plasma, platelets)
    #[arg(long, value_parser = parse_donation_type)]
    pub(crate) donation_type: DonationType,
    /// Date of the last completed donation (YYYY-MM-DD); omit for first-time donors
    #[arg(long, value_parser = parse_date)]
    pub(crate) last_donation: Option<NaiveDate>,
    /// Type of the last completed donation (informational; the requested type's interval applies)
    #[arg(long, value_parser = parse_donation_type, requires = "last_donation")]
    pub(crate) last_type: Option<DonationType>,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the walkthrough date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Days since the sample donor's last completed whole blood donation
    #[arg(long, default_value_t = 40)]
    pub(crate) days_since_last: u64,
}

pub(crate) fn run_eligibility_check(args: EligibilityCheckArgs) -> Result<(), AppError> {
    let EligibilityCheckArgs {
        donation_type,
        last_donation,
        last_type,
        today,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let last = last_donation.map(|date| LastDonation {
        date,
        donation_type: last_type.unwrap_or(donation_type),
    });

    let decision = evaluate(donation_type, last.as_ref(), today).map_err(BookingError::from)?;

    println!("Eligibility check for {} on {}", donation_type, today);
    match &last {
        Some(last) => println!(
            "- Last completed donation: {} on {}",
            last.donation_type, last.date
        ),
        None => println!("- Last completed donation: none on record"),
    }
    println!(
        "- Required interval: {} days",
        minimum_interval_days(donation_type)
    );
    println!(
        "- Decision: {}",
        if decision.eligible {
            "eligible"
        } else {
            "not eligible"
        }
    );
    println!("  {}", decision.summary());

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        days_since_last,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let last_donation = today.checked_sub_days(Days::new(days_since_last)).ok_or_else(|| {
        BookingError::from(EligibilityError::InvalidArgument(format!(
            "{days_since_last} days before {today} is out of range"
        )))
    })?;

    println!("Blood donation booking demo ({today})");
    println!("Donation intervals:");
    for donation_type in DonationType::ALL {
        println!(
            "  - {}: {} days",
            donation_type,
            minimum_interval_days(donation_type)
        );
    }

    let (hospital_id, hospital_name, _) = DEMO_HOSPITALS[0];
    let hospital = UserId(hospital_id);
    let repository = Arc::new(InMemoryAppointmentRepository::default());
    let seed_id = repository.next_id().map_err(BookingError::from)?;
    repository
        .insert(DonationRecord {
            id: seed_id,
            donor_id: DEMO_DONOR,
            hospital_id: hospital,
            donation_type: DonationType::WholeBlood,
            scheduled_date: last_donation,
            scheduled_time: demo_time(9, 0),
            status: AppointmentStatus::Completed,
        })
        .map_err(BookingError::from)?;

    let service = AppointmentService::new(
        repository,
        Arc::new(InMemoryHospitalDirectory::seeded()),
        Arc::new(FixedClock(today)),
    );
    let donor = Requester::donor(DEMO_DONOR);
    println!(
        "\nDonor {} last gave whole blood at {} on {}",
        DEMO_DONOR, hospital_name, last_donation
    );

    let mut booked: Option<AppointmentId> = None;
    for donation_type in DonationType::ALL {
        let request = BookingRequest {
            hospital_id: hospital,
            donation_type,
            date: today,
            time: demo_time(10, 30),
        };
        match service.book_appointment(&donor, request) {
            Ok(record) => {
                println!(
                    "- {}: booked appointment {} ({})",
                    donation_type, record.id, record.status
                );
                booked.get_or_insert(record.id);
            }
            Err(BookingError::NotEligible { next_eligible_date }) => {
                println!(
                    "- {}: rejected, next eligible date {}",
                    donation_type,
                    next_eligible_date.format("%d/%m/%Y")
                );
            }
            Err(other) => return Err(other.into()),
        }
    }

    let Some(appointment_id) = booked else {
        println!("\nNo appointment could be booked today.");
        return Ok(());
    };

    let desk = Requester::hospital(hospital);
    for status in [AppointmentStatus::Confirmed, AppointmentStatus::Completed] {
        let record = service.update_status(&desk, appointment_id, status)?;
        println!("\n{} marked appointment {} {}", hospital_name, record.id, record.status);
    }

    println!("\nDonation history:");
    for entry in service.donation_history(&donor)? {
        println!(
            "  - {} {} at {}",
            entry.date,
            entry.donation_type,
            entry.location.as_deref().unwrap_or("unknown location")
        );
    }

    Ok(())
}

fn demo_time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}
