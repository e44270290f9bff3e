use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The six fixed profile sections, in workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    BasicDetails,
    Skills,
    Projects,
    Certifications,
    Experience,
    JobRoles,
}

/// Static facts about a section kind.
#[derive(Debug, Clone, Copy)]
pub struct SectionDescriptor {
    pub kind: SectionKind,
    pub step: u8,
    pub slug: &'static str,
    pub title: &'static str,
    pub required: bool,
}

const DESCRIPTORS: [SectionDescriptor; 6] = [
    SectionDescriptor {
        kind: SectionKind::BasicDetails,
        step: 1,
        slug: "basic-details",
        title: "Basic Details",
        required: true,
    },
    SectionDescriptor {
        kind: SectionKind::Skills,
        step: 2,
        slug: "skills",
        title: "Skills",
        required: true,
    },
    SectionDescriptor {
        kind: SectionKind::Projects,
        step: 3,
        slug: "projects",
        title: "Projects",
        required: false,
    },
    SectionDescriptor {
        kind: SectionKind::Certifications,
        step: 4,
        slug: "certifications",
        title: "Certifications",
        required: false,
    },
    SectionDescriptor {
        kind: SectionKind::Experience,
        step: 5,
        slug: "experience",
        title: "Experience",
        required: false,
    },
    SectionDescriptor {
        kind: SectionKind::JobRoles,
        step: 6,
        slug: "job-roles",
        title: "Job Roles",
        required: true,
    },
];

impl SectionKind {
    /// All kinds in step order.
    pub const ALL: [SectionKind; 6] = [
        SectionKind::BasicDetails,
        SectionKind::Skills,
        SectionKind::Projects,
        SectionKind::Certifications,
        SectionKind::Experience,
        SectionKind::JobRoles,
    ];

    pub fn descriptor(self) -> &'static SectionDescriptor {
        &DESCRIPTORS[self.index()]
    }

    pub fn required(self) -> bool {
        self.descriptor().required
    }

    pub fn step(self) -> u8 {
        self.descriptor().step
    }

    pub fn slug(self) -> &'static str {
        self.descriptor().slug
    }

    pub fn title(self) -> &'static str {
        self.descriptor().title
    }

    /// Stable key used in the `profile_sections.kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::BasicDetails => "basic_details",
            SectionKind::Skills => "skills",
            SectionKind::Projects => "projects",
            SectionKind::Certifications => "certifications",
            SectionKind::Experience => "experience",
            SectionKind::JobRoles => "job_roles",
        }
    }

    pub fn from_step(step: u8) -> Option<SectionKind> {
        DESCRIPTORS.iter().find(|d| d.step == step).map(|d| d.kind)
    }

    pub fn from_slug(slug: &str) -> Option<SectionKind> {
        SectionKind::ALL.into_iter().find(|k| k.slug() == slug)
    }

    fn index(self) -> usize {
        match self {
            SectionKind::BasicDetails => 0,
            SectionKind::Skills => 1,
            SectionKind::Projects => 2,
            SectionKind::Certifications => 3,
            SectionKind::Experience => 4,
            SectionKind::JobRoles => 5,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Payload shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub profile_picture: String,
    pub portfolio: String,
    pub bio: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skills {
    pub languages: Vec<String>,
    pub technologies: Vec<String>,
    pub frameworks: Vec<String>,
    pub tools: Vec<String>,
    pub soft_skills: Vec<String>,
}

impl Skills {
    pub fn categories(&self) -> [&[String]; 5] {
        [
            &self.languages,
            &self.technologies,
            &self.frameworks,
            &self.tools,
            &self.soft_skills,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    pub name: String,
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub skills_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Projects {
    pub projects: Vec<ProjectEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificationEntry {
    pub name: String,
    pub platform: String,
    pub skills: Vec<String>,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certifications {
    pub certifications: Vec<CertificationEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub company_name: String,
    pub position: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub is_current: bool,
    pub skills: Vec<String>,
    pub achievements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub experiences: Vec<ExperienceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobRoles {
    pub desired_job_roles: Vec<String>,
}

/// A full section document. Saving always replaces the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionPayload {
    BasicDetails(BasicDetails),
    Skills(Skills),
    Projects(Projects),
    Certifications(Certifications),
    Experience(Experience),
    JobRoles(JobRoles),
}

impl SectionPayload {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionPayload::BasicDetails(_) => SectionKind::BasicDetails,
            SectionPayload::Skills(_) => SectionKind::Skills,
            SectionPayload::Projects(_) => SectionKind::Projects,
            SectionPayload::Certifications(_) => SectionKind::Certifications,
            SectionPayload::Experience(_) => SectionKind::Experience,
            SectionPayload::JobRoles(_) => SectionKind::JobRoles,
        }
    }

    /// The kind-specific empty document used when nothing has been saved.
    pub fn empty(kind: SectionKind) -> SectionPayload {
        match kind {
            SectionKind::BasicDetails => SectionPayload::BasicDetails(BasicDetails::default()),
            SectionKind::Skills => SectionPayload::Skills(Skills::default()),
            SectionKind::Projects => SectionPayload::Projects(Projects::default()),
            SectionKind::Certifications => {
                SectionPayload::Certifications(Certifications::default())
            }
            SectionKind::Experience => SectionPayload::Experience(Experience::default()),
            SectionKind::JobRoles => SectionPayload::JobRoles(JobRoles::default()),
        }
    }

    /// Empty default for `kind`, pre-filling the account email on basic details.
    pub fn default_for(kind: SectionKind, account_email: Option<&str>) -> SectionPayload {
        match (kind, account_email) {
            (SectionKind::BasicDetails, Some(email)) => {
                SectionPayload::BasicDetails(BasicDetails {
                    email: email.to_string(),
                    ..BasicDetails::default()
                })
            }
            _ => SectionPayload::empty(kind),
        }
    }

    /// Decodes a JSON document as the payload of `kind`.
    pub fn from_value(kind: SectionKind, value: Value) -> Result<SectionPayload, serde_json::Error> {
        Ok(match kind {
            SectionKind::BasicDetails => SectionPayload::BasicDetails(serde_json::from_value(value)?),
            SectionKind::Skills => SectionPayload::Skills(serde_json::from_value(value)?),
            SectionKind::Projects => SectionPayload::Projects(serde_json::from_value(value)?),
            SectionKind::Certifications => {
                SectionPayload::Certifications(serde_json::from_value(value)?)
            }
            SectionKind::Experience => SectionPayload::Experience(serde_json::from_value(value)?),
            SectionKind::JobRoles => SectionPayload::JobRoles(serde_json::from_value(value)?),
        })
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Number of list entries, or `None` for record-shaped sections.
    pub fn entry_count(&self) -> Option<usize> {
        match self {
            SectionPayload::BasicDetails(_) | SectionPayload::Skills(_) => None,
            SectionPayload::Projects(p) => Some(p.projects.len()),
            SectionPayload::Certifications(c) => Some(c.certifications.len()),
            SectionPayload::Experience(e) => Some(e.experiences.len()),
            SectionPayload::JobRoles(j) => Some(j.desired_job_roles.len()),
        }
    }
}
