//! Staff listing: filters, sort keys and pagination over application records.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{ApplicationRecord, ApplicationStatus, PreRegistrationDetail};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    ApplicationNo,
    StudentName,
    ProgramChoice,
    AssignmentCountry,
    SubmittedAt,
    Status,
    #[default]
    CreatedAt,
}

impl SortKey {
    /// Unknown keys sort by creation time.
    pub fn from_param(raw: &str) -> Self {
        match raw.trim() {
            "applicationNo" => Self::ApplicationNo,
            "studentName" => Self::StudentName,
            "programChoice" => Self::ProgramChoice,
            "assignmentCountry" => Self::AssignmentCountry,
            "submittedAt" => Self::SubmittedAt,
            "status" => Self::Status,
            _ => Self::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Parsed listing request. Built leniently from [`ListParams`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub status: Option<ApplicationStatus>,
    pub search: Option<String>,
    pub program: Option<String>,
    pub country: Option<String>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl Default for ApplicationQuery {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            program: None,
            country: None,
            sort_by: SortKey::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Raw query-string parameters as sent by the admin console.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub program: Option<String>,
    pub country: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl From<ListParams> for ApplicationQuery {
    fn from(params: ListParams) -> Self {
        let sort_order = match params.sort_order.as_deref().map(str::trim) {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        let page = params
            .page
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = params
            .limit
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        Self {
            status: params
                .status
                .as_deref()
                .and_then(|raw| ApplicationStatus::from_label(raw.trim())),
            search: non_blank(params.search),
            program: non_blank(params.program),
            country: non_blank(params.country),
            sort_by: params
                .sort_by
                .as_deref()
                .map(SortKey::from_param)
                .unwrap_or_default(),
            sort_order,
            page,
            limit,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn detail_text(record: &ApplicationRecord, key: SortKey) -> &str {
    let Some(detail) = record.pre_registration.as_ref() else {
        return "";
    };
    match key {
        SortKey::StudentName => &detail.student_name,
        SortKey::ProgramChoice => &detail.program_choice,
        SortKey::AssignmentCountry => &detail.assignment_country,
        _ => "",
    }
}

fn contains_folded(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl ApplicationQuery {
    /// Records without a detail never match.
    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        let Some(detail) = record.pre_registration.as_ref() else {
            return false;
        };
        let application = &record.application;

        if let Some(status) = self.status {
            if application.status != status {
                return false;
            }
        }
        if let Some(term) = self.search.as_deref() {
            let term = term.to_lowercase();
            let hit = contains_folded(application.application_no.as_str(), &term)
                || contains_folded(&detail.student_name, &term)
                || contains_folded(&detail.applicant_name, &term);
            if !hit {
                return false;
            }
        }
        if let Some(program) = self.program.as_deref() {
            if detail.program_choice != program {
                return false;
            }
        }
        if let Some(country) = self.country.as_deref() {
            if detail.assignment_country != country {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &ApplicationRecord, b: &ApplicationRecord) -> Ordering {
        let (left, right) = (&a.application, &b.application);

        let ordering = match self.sort_by {
            SortKey::ApplicationNo => left.application_no.cmp(&right.application_no),
            SortKey::StudentName | SortKey::ProgramChoice | SortKey::AssignmentCountry => {
                detail_text(a, self.sort_by).cmp(detail_text(b, self.sort_by))
            }
            SortKey::SubmittedAt => left
                .submitted_at
                .cmp(&right.submitted_at)
                .then(left.created_at.cmp(&right.created_at)),
            SortKey::Status => left.status.label().cmp(right.status.label()),
            SortKey::CreatedAt => left.created_at.cmp(&right.created_at),
        };

        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Filters, sorts and slices `records` into one page.
    pub fn apply<I>(&self, records: I) -> ApplicationPage
    where
        I: IntoIterator<Item = ApplicationRecord>,
    {
        let mut matching: Vec<ApplicationRecord> =
            records.into_iter().filter(|record| self.matches(record)).collect();
        matching.sort_by(|a, b| self.compare(a, b));

        let total = matching.len() as u64;
        let skip = (self.page.max(1) as usize - 1).saturating_mul(self.limit as usize);
        let items = matching
            .into_iter()
            .skip(skip)
            .take(self.limit as usize)
            .collect();

        ApplicationPage { items, total }
    }
}

/// One page of matches plus the unpaginated total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationPage {
    pub items: Vec<ApplicationRecord>,
    pub total: u64,
}

/// Distinct values offered as filters in the admin console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub programs: Vec<String>,
    pub countries: Vec<String>,
}

impl FilterOptions {
    pub fn collect<'a, I>(details: I) -> Self
    where
        I: IntoIterator<Item = &'a PreRegistrationDetail>,
    {
        let mut programs = BTreeSet::new();
        let mut countries = BTreeSet::new();
        for detail in details {
            if !detail.program_choice.is_empty() {
                programs.insert(detail.program_choice.clone());
            }
            if !detail.assignment_country.is_empty() {
                countries.insert(detail.assignment_country.clone());
            }
        }
        Self {
            programs: programs.into_iter().collect(),
            countries: countries.into_iter().collect(),
        }
    }
}

/// Listing response returned to staff.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListing {
    pub items: Vec<ApplicationRecord>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub filter_options: FilterOptions,
}
