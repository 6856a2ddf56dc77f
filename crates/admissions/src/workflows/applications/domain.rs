use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::workflows::registration::{PeriodId, RegistrationPeriod};

/// Identifier wrapper for stored applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ApplicationId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw.trim()).map(Self)
    }
}

/// Human-readable application number such as `APP-2025-0007`. Never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationNumber(pub String);

impl ApplicationNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    ChangesRequested,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::ChangesRequested,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "DRAFT",
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::UnderReview => "UNDER_REVIEW",
            ApplicationStatus::ChangesRequested => "CHANGES_REQUESTED",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    /// Exact, case-sensitive match on the wire label.
    pub fn from_label(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentGender {
    Male,
    Female,
}

/// Multi-step intake form as posted by the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreRegistrationSubmission {
    pub applicant_email: String,
    pub applicant_name: String,
    pub applicant_relationship: String,
    pub reason_living_abroad: String,
    pub reason_to_apply: String,
    pub assignment_city: String,
    pub assignment_country: String,
    #[serde(deserialize_with = "deserialize_form_date")]
    pub domicile_start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_form_date")]
    pub domicile_end_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_form_date")]
    pub permit_expiry_date: NaiveDate,
    pub program_choice: String,
    pub education_level: String,
    pub grade_applied: String,
    pub student_name: String,
    pub student_gender: StudentGender,
    #[serde(deserialize_with = "deserialize_form_date")]
    pub student_birth_date: NaiveDate,
    pub last_education_location: String,
    #[serde(default)]
    pub nisn: Option<String>,
}

impl PreRegistrationSubmission {
    /// Splits the form into the applicant email and the detail record.
    pub(crate) fn into_detail(self) -> (String, PreRegistrationDetail) {
        let nisn = self
            .nisn
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let detail = PreRegistrationDetail {
            applicant_name: self.applicant_name.trim().to_string(),
            applicant_relationship: self.applicant_relationship.trim().to_string(),
            reason_living_abroad: self.reason_living_abroad.trim().to_string(),
            reason_to_apply: self.reason_to_apply.trim().to_string(),
            assignment_city: self.assignment_city.trim().to_string(),
            assignment_country: self.assignment_country.trim().to_string(),
            domicile_start_date: self.domicile_start_date,
            domicile_end_date: self.domicile_end_date,
            permit_expiry_date: self.permit_expiry_date,
            program_choice: self.program_choice.trim().to_string(),
            education_level: self.education_level.trim().to_string(),
            grade_applied: self.grade_applied.trim().to_string(),
            student_name: self.student_name.trim().to_string(),
            student_gender: self.student_gender,
            student_birth_date: self.student_birth_date,
            last_education_location: self.last_education_location.trim().to_string(),
            nisn,
        };
        (self.applicant_email.trim().to_string(), detail)
    }
}

/// Student, parent and program data owned by exactly one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreRegistrationDetail {
    pub applicant_name: String,
    pub applicant_relationship: String,
    pub reason_living_abroad: String,
    pub reason_to_apply: String,
    pub assignment_city: String,
    pub assignment_country: String,
    pub domicile_start_date: NaiveDate,
    pub domicile_end_date: NaiveDate,
    pub permit_expiry_date: NaiveDate,
    pub program_choice: String,
    pub education_level: String,
    pub grade_applied: String,
    pub student_name: String,
    pub student_gender: StudentGender,
    pub student_birth_date: NaiveDate,
    pub last_education_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nisn: Option<String>,
}

/// Application row. Decision fields change only through the lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub application_no: ApplicationNumber,
    pub applicant_email: String,
    pub registration_period_id: PeriodId,
    pub status: ApplicationStatus,
    pub decision_reason: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application joined with its pre-registration detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    #[serde(flatten)]
    pub application: Application,
    pub pre_registration: Option<PreRegistrationDetail>,
}

/// Detail view for staff, including the owning registration period.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetailView {
    #[serde(flatten)]
    pub record: ApplicationRecord,
    pub registration_period: Option<RegistrationPeriod>,
}

/// Response body for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub application_no: ApplicationNumber,
}

impl From<&Application> for SubmissionReceipt {
    fn from(application: &Application) -> Self {
        Self {
            application_id: application.id,
            application_no: application.application_no.clone(),
        }
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp, keeping the calendar date.
pub fn parse_form_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|err| format!("failed to parse '{raw}' as a date ({err})"))
}

fn deserialize_form_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_form_date(&raw).map_err(serde::de::Error::custom)
}
