//! Field-level checks on the intake form, run before any lifecycle rule.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::domain::PreRegistrationSubmission;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every failing field of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|error| error.field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid submission fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern compiles")
    })
}

pub fn is_valid_email(raw: &str) -> bool {
    email_pattern().is_match(raw.trim())
}

pub fn validate_submission(submission: &PreRegistrationSubmission) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if !is_valid_email(&submission.applicant_email) {
        errors.push(FieldError {
            field: "applicantEmail",
            message: "must be a valid email address".to_string(),
        });
    }

    let required = [
        ("applicantName", &submission.applicant_name),
        ("applicantRelationship", &submission.applicant_relationship),
        ("reasonLivingAbroad", &submission.reason_living_abroad),
        ("reasonToApply", &submission.reason_to_apply),
        ("assignmentCity", &submission.assignment_city),
        ("assignmentCountry", &submission.assignment_country),
        ("programChoice", &submission.program_choice),
        ("educationLevel", &submission.education_level),
        ("gradeApplied", &submission.grade_applied),
        ("studentName", &submission.student_name),
        ("lastEducationLocation", &submission.last_education_location),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(FieldError {
                field,
                message: "must not be empty".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
