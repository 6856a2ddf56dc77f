use admissions::clock::{Clock, FixedClock};
use admissions::config::IntakeConfig;
use admissions::error::AppError;
use admissions::store::InMemoryStore;
use admissions::workflows::applications::{
    ApplicationQuery, PreRegistrationService, PreRegistrationSubmission, StudentGender,
};
use admissions::workflows::registration::{parse_instant, NewPeriod, RegistrationWindowService};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Instant the walkthrough runs at (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Reject the application instead of approving it.
    #[arg(long)]
    pub(crate) reject: bool,
    /// Print the stored application as JSON at the end.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let start = args.now.unwrap_or_else(Utc::now);
    let clock = Arc::new(FixedClock::new(start));
    let store = Arc::new(InMemoryStore::new());
    let window = Arc::new(RegistrationWindowService::new(store.clone(), clock.clone()));
    let intake = PreRegistrationService::new(
        store,
        window.clone(),
        clock.clone(),
        IntakeConfig::default(),
    );

    println!("Pre-registration walkthrough at {}", start.to_rfc3339());

    let period = match window.create_period(NewPeriod {
        name: format!("Demo intake {}", start.format("%B %Y")),
        start_at: start - Duration::days(1),
        end_at: start + Duration::days(30),
    }) {
        Ok(period) => period,
        Err(err) => {
            println!("  Period could not be created: {}", err);
            return Ok(());
        }
    };
    println!(
        "  Created period '{}' ({} to {}), status {}",
        period.name,
        period.start_at.format("%Y-%m-%d"),
        period.end_at.format("%Y-%m-%d"),
        period.status.label()
    );

    match intake.submit(sample_submission()) {
        Ok(_) => println!("  Unexpected: submission accepted while the period was closed"),
        Err(err) => println!("  Submission while closed refused: {}", err),
    }

    if let Err(err) = window.open_period(&period.id) {
        println!("  Period could not be opened: {}", err);
        return Ok(());
    }
    println!("  Period opened");

    let mut second_form = sample_submission();
    second_form.student_name = "Nadia Putri".to_string();
    second_form.student_gender = StudentGender::Female;
    second_form.program_choice = "Bilingual".to_string();

    let mut accepted = Vec::new();
    for form in [sample_submission(), second_form] {
        clock.advance(Duration::minutes(10));
        match intake.submit(form) {
            Ok(record) => {
                println!(
                    "  Submission accepted as {} (status {})",
                    record.application.application_no,
                    record.application.status.label()
                );
                accepted.push(record.application.id);
            }
            Err(err) => println!("  Submission refused: {}", err),
        }
    }
    let [first, second] = accepted.as_slice() else {
        return Ok(());
    };

    clock.advance(Duration::hours(2));
    match intake.request_changes(second, Some("Please attach the residence permit")) {
        Ok(updated) => println!(
            "  Changes requested on {}: {}",
            updated.application.application_no,
            updated.application.decision_reason.unwrap_or_default()
        ),
        Err(err) => println!("  Request for changes failed: {}", err),
    }

    clock.advance(Duration::days(1));
    let decision = if args.reject {
        intake.reject(first, Some("Incomplete documents"))
    } else {
        intake.approve(first)
    };
    match decision {
        Ok(updated) => println!(
            "  Decision on {}: {}{}",
            updated.application.application_no,
            updated.application.status.label(),
            updated
                .application
                .decision_reason
                .map(|reason| format!(" ({reason})"))
                .unwrap_or_default()
        ),
        Err(err) => println!("  Decision failed: {}", err),
    }

    if !args.reject {
        match intake.approve(first) {
            Ok(_) => println!("  Unexpected: second approval accepted"),
            Err(err) => println!("  Second approval refused: {}", err),
        }
    }

    match intake.list(&ApplicationQuery::default()) {
        Ok(listing) => {
            println!("\nAdmin listing ({} total)", listing.total);
            for item in &listing.items {
                let student = item
                    .pre_registration
                    .as_ref()
                    .map(|detail| detail.student_name.as_str())
                    .unwrap_or("-");
                println!(
                    "  {} {:<18} {}",
                    item.application.application_no,
                    item.application.status.label(),
                    student
                );
            }
            println!(
                "  Programs offered: {}",
                listing.filter_options.programs.join(", ")
            );
        }
        Err(err) => println!("  Listing unavailable: {}", err),
    }

    clock.set(period.end_at);
    match window.active_period() {
        Ok(Some(_)) => println!("  Unexpected: period still admitting at its end"),
        Ok(None) => println!(
            "  At {} no period admits submissions",
            clock.now().to_rfc3339()
        ),
        Err(err) => println!("  Window lookup failed: {}", err),
    }

    if args.json {
        match intake.get(first).map(|view| serde_json::to_string_pretty(&view)) {
            Ok(Ok(json)) => println!("\nStored application:\n{}", json),
            Ok(Err(err)) => println!("\nStored application unavailable: {}", err),
            Err(err) => println!("\nStored application unavailable: {}", err),
        }
    }

    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn sample_submission() -> PreRegistrationSubmission {
    PreRegistrationSubmission {
        applicant_email: "parent@example.com".to_string(),
        applicant_name: "Siti Rahma".to_string(),
        applicant_relationship: "Mother".to_string(),
        reason_living_abroad: "Diplomatic posting".to_string(),
        reason_to_apply: "Continuity of national curriculum".to_string(),
        assignment_city: "Kuala Lumpur".to_string(),
        assignment_country: "Malaysia".to_string(),
        domicile_start_date: date(2024, 1, 1),
        domicile_end_date: date(2026, 12, 31),
        permit_expiry_date: date(2027, 6, 30),
        program_choice: "Regular".to_string(),
        education_level: "SD".to_string(),
        grade_applied: "4".to_string(),
        student_name: "Ahmad Fauzi".to_string(),
        student_gender: StudentGender::Male,
        student_birth_date: date(2015, 3, 14),
        last_education_location: "SD Negeri 1 Bandung".to_string(),
        nisn: None,
    }
}
