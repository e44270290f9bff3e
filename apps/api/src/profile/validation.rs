//! Section Validator: pure predicates over section payloads.
//!
//! Two tiers:
//! - step gate: may the user advance past this step with the payload as-is?
//! - entry check: is one list item well-formed? Only consulted for entries that exist.
//!
//! A third predicate, `is_filled`, answers "does this section count as done" and
//! drives the completion state and the resume position.

use serde::{Deserialize, Serialize};

use crate::profile::models::{
    BasicDetails, CertificationEntry, ExperienceEntry, JobRoles, ProjectEntry, SectionKind,
    SectionPayload, Skills,
};

/// A field that failed a predicate, with a message suitable for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingField {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub kind: SectionKind,
    pub passed: bool,
    pub missing_fields: Vec<MissingField>,
}

impl ValidationReport {
    fn from_missing(kind: SectionKind, missing_fields: Vec<MissingField>) -> Self {
        Self {
            kind,
            passed: missing_fields.is_empty(),
            missing_fields,
        }
    }

    /// Human-readable summary, one line per missing field.
    pub fn summary(&self) -> String {
        self.missing_fields
            .iter()
            .map(|m| m.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Entry-level validity for list sections.
pub trait EntryRules {
    /// Label used in messages, e.g. "Project".
    const LABEL: &'static str;
    /// Wire name of the list field, e.g. "projects".
    const LIST_FIELD: &'static str;

    /// `(field, human name)` pairs this entry is missing.
    fn missing(&self) -> Vec<(&'static str, &'static str)>;
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl EntryRules for ProjectEntry {
    const LABEL: &'static str = "Project";
    const LIST_FIELD: &'static str = "projects";

    fn missing(&self) -> Vec<(&'static str, &'static str)> {
        let mut missing = Vec::new();
        if blank(&self.name) {
            missing.push(("name", "Name"));
        }
        if blank(&self.start_date) {
            missing.push(("startDate", "Start date"));
        }
        if !self.details.iter().any(|d| !blank(d)) {
            missing.push(("details", "At least one detail point"));
        }
        missing
    }
}

impl EntryRules for CertificationEntry {
    const LABEL: &'static str = "Certification";
    const LIST_FIELD: &'static str = "certifications";

    fn missing(&self) -> Vec<(&'static str, &'static str)> {
        let mut missing = Vec::new();
        if blank(&self.name) {
            missing.push(("name", "Name"));
        }
        if blank(&self.platform) {
            missing.push(("platform", "Platform"));
        }
        if blank(&self.start_date) {
            missing.push(("startDate", "Start date"));
        }
        missing
    }
}

impl EntryRules for ExperienceEntry {
    const LABEL: &'static str = "Experience";
    const LIST_FIELD: &'static str = "experiences";

    fn missing(&self) -> Vec<(&'static str, &'static str)> {
        let mut missing = Vec::new();
        if blank(&self.position) {
            missing.push(("position", "Position"));
        }
        if blank(&self.company_name) {
            missing.push(("companyName", "Company name"));
        }
        if blank(&self.start_date) {
            missing.push(("startDate", "Start date"));
        }
        missing
    }
}

/// Collects entry failures as `projects[0].startDate` style fields.
fn entry_failures<E: EntryRules>(entries: &[E]) -> Vec<MissingField> {
    entries
        .iter()
        .enumerate()
        .flat_map(|(i, entry)| {
            entry.missing().into_iter().map(move |(field, name)| MissingField {
                field: format!("{}[{}].{}", E::LIST_FIELD, i, field),
                message: format!("{} {}: {} is required", E::LABEL, i + 1, name),
            })
        })
        .collect()
}

const BASIC_DETAILS_REQUIRED: &[(&str, &str)] = &[
    ("firstName", "First name"),
    ("lastName", "Last name"),
    ("email", "Email"),
    ("phone", "Phone number"),
    ("linkedin", "LinkedIn profile"),
    ("github", "GitHub profile"),
];

fn basic_details_missing(details: &BasicDetails) -> Vec<MissingField> {
    let values = [
        &details.first_name,
        &details.last_name,
        &details.email,
        &details.phone,
        &details.linkedin,
        &details.github,
    ];
    BASIC_DETAILS_REQUIRED
        .iter()
        .zip(values)
        .filter(|(_, value)| blank(value))
        .map(|((field, name), _)| MissingField {
            field: field.to_string(),
            message: format!("{name} is required"),
        })
        .collect()
}

fn skills_missing(skills: &Skills) -> Vec<MissingField> {
    if skills.categories().iter().any(|c| !c.is_empty()) {
        return vec![];
    }
    vec![MissingField {
        field: "skills".to_string(),
        message: "At least one skill is required".to_string(),
    }]
}

fn job_roles_missing(roles: &JobRoles) -> Vec<MissingField> {
    if !roles.desired_job_roles.is_empty() {
        return vec![];
    }
    vec![MissingField {
        field: "desiredJobRoles".to_string(),
        message: "At least one job role is required".to_string(),
    }]
}

/// Section-level step gate used for Next and for direct saves.
///
/// Optional list sections pass when empty; any malformed entry fails the gate.
pub fn check_step(payload: &SectionPayload) -> ValidationReport {
    let missing = match payload {
        SectionPayload::BasicDetails(d) => basic_details_missing(d),
        SectionPayload::Skills(s) => skills_missing(s),
        SectionPayload::Projects(p) => entry_failures(&p.projects),
        SectionPayload::Certifications(c) => entry_failures(&c.certifications),
        SectionPayload::Experience(e) => entry_failures(&e.experiences),
        SectionPayload::JobRoles(j) => job_roles_missing(j),
    };
    ValidationReport::from_missing(payload.kind(), missing)
}

/// Whether a section counts as done.
///
/// Required sections: the step gate. Optional sections: at least one entry,
/// all of them well-formed.
pub fn is_filled(payload: &SectionPayload) -> bool {
    if payload.kind().required() {
        return check_step(payload).passed;
    }
    payload.entry_count().unwrap_or(0) > 0 && check_step(payload).passed
}

/// Completion predicate for an optional stored payload; `None` is never filled.
pub fn is_filled_opt(payload: Option<&SectionPayload>) -> bool {
    payload.map(is_filled).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::{Certifications, Experience, Projects};

    fn valid_basic_details() -> BasicDetails {
        BasicDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+44 20 0000 0000".to_string(),
            linkedin: "linkedin.com/in/ada".to_string(),
            github: "github.com/ada".to_string(),
            ..BasicDetails::default()
        }
    }

    fn valid_project() -> ProjectEntry {
        ProjectEntry {
            name: "Analytical Engine".to_string(),
            details: vec!["Designed the mill".to_string()],
            start_date: "1843-01-01".to_string(),
            ..ProjectEntry::default()
        }
    }

    #[test]
    fn test_basic_details_complete() {
        let report = check_step(&SectionPayload::BasicDetails(valid_basic_details()));
        assert!(report.passed);
        assert!(report.missing_fields.is_empty());
    }

    #[test]
    fn test_basic_details_whitespace_is_empty() {
        let details = BasicDetails {
            first_name: "   ".to_string(),
            ..valid_basic_details()
        };
        let report = check_step(&SectionPayload::BasicDetails(details));
        assert!(!report.passed);
        assert_eq!(report.missing_fields.len(), 1);
        assert_eq!(report.missing_fields[0].field, "firstName");
    }

    #[test]
    fn test_basic_details_lists_every_missing_field() {
        let report = check_step(&SectionPayload::BasicDetails(BasicDetails::default()));
        let fields: Vec<_> = report.missing_fields.iter().map(|m| m.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["firstName", "lastName", "email", "phone", "linkedin", "github"]
        );
    }

    #[test]
    fn test_basic_details_optional_fields_ignored() {
        let details = BasicDetails {
            bio: String::new(),
            portfolio: String::new(),
            ..valid_basic_details()
        };
        assert!(check_step(&SectionPayload::BasicDetails(details)).passed);
    }

    #[test]
    fn test_skills_any_category_suffices() {
        let skills = Skills {
            soft_skills: vec!["Mentoring".to_string()],
            ..Skills::default()
        };
        assert!(check_step(&SectionPayload::Skills(skills)).passed);
        assert!(!check_step(&SectionPayload::Skills(Skills::default())).passed);
    }

    #[test]
    fn test_empty_optional_sections_pass_the_gate() {
        for kind in [
            SectionKind::Projects,
            SectionKind::Certifications,
            SectionKind::Experience,
        ] {
            let report = check_step(&SectionPayload::empty(kind));
            assert!(report.passed, "{kind} should pass when empty");
        }
    }

    #[test]
    fn test_empty_optional_sections_are_not_filled() {
        for kind in [
            SectionKind::Projects,
            SectionKind::Certifications,
            SectionKind::Experience,
        ] {
            assert!(!is_filled(&SectionPayload::empty(kind)));
        }
    }

    #[test]
    fn test_project_missing_start_date_blocks() {
        let project = ProjectEntry {
            start_date: String::new(),
            ..valid_project()
        };
        let report = check_step(&SectionPayload::Projects(Projects {
            projects: vec![project],
        }));
        assert!(!report.passed);
        assert_eq!(report.missing_fields[0].field, "projects[0].startDate");
        assert_eq!(
            report.missing_fields[0].message,
            "Project 1: Start date is required"
        );
    }

    #[test]
    fn test_project_needs_non_blank_detail_line() {
        let project = ProjectEntry {
            details: vec!["".to_string(), "  ".to_string()],
            ..valid_project()
        };
        assert_eq!(project.missing(), vec![("details", "At least one detail point")]);
    }

    #[test]
    fn test_one_bad_entry_fails_whole_list() {
        let payload = SectionPayload::Projects(Projects {
            projects: vec![valid_project(), ProjectEntry::default()],
        });
        let report = check_step(&payload);
        assert!(!report.passed);
        assert!(report
            .missing_fields
            .iter()
            .all(|m| m.field.starts_with("projects[1].")));
        assert!(!is_filled(&payload));
    }

    #[test]
    fn test_certification_entry_rules() {
        let cert = CertificationEntry {
            name: "CKA".to_string(),
            platform: " ".to_string(),
            start_date: "2024-03-01".to_string(),
            ..CertificationEntry::default()
        };
        let payload = SectionPayload::Certifications(Certifications {
            certifications: vec![cert],
        });
        let report = check_step(&payload);
        assert_eq!(report.missing_fields.len(), 1);
        assert_eq!(report.missing_fields[0].field, "certifications[0].platform");
    }

    #[test]
    fn test_experience_entry_rules() {
        let exp = ExperienceEntry {
            position: "SRE".to_string(),
            company_name: "Initech".to_string(),
            start_date: "2020-06-01".to_string(),
            ..ExperienceEntry::default()
        };
        let payload = SectionPayload::Experience(Experience {
            experiences: vec![exp],
        });
        assert!(check_step(&payload).passed);
        assert!(is_filled(&payload));
    }

    #[test]
    fn test_job_roles_require_one() {
        assert!(!check_step(&SectionPayload::JobRoles(JobRoles::default())).passed);
        let roles = JobRoles {
            desired_job_roles: vec!["Backend Engineer".to_string()],
        };
        assert!(is_filled(&SectionPayload::JobRoles(roles)));
    }

    #[test]
    fn test_absent_is_never_filled() {
        assert!(!is_filled_opt(None));
    }

    #[test]
    fn test_summary_joins_messages() {
        let report = check_step(&SectionPayload::JobRoles(JobRoles::default()));
        assert_eq!(report.summary(), "At least one job role is required");
    }
}
