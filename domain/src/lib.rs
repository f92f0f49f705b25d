use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Invalid field value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },
    #[error("Missing required field '{0}'")]
    MissingField(String),
}

// --- Candidate ID ---
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh random (v4) identity in hyphenated form.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CandidateId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<CandidateId> for String {
    fn from(id: CandidateId) -> Self {
        id.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Attachments ---

/// Extension used when the uploaded file name carries none.
pub const DEFAULT_ATTACHMENT_EXTENSION: &str = "bin";

/// The resume formats accepted on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Pdf,
    /// Legacy binary Word format (`.doc`).
    Word,
    /// Office Open XML Word format (`.docx`).
    WordXml,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 3] = [Self::Pdf, Self::Word, Self::WordXml];

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Word => "application/msword",
            Self::WordXml => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Matches a declared content type against the allowed set.
    /// MIME parameters (`; charset=...`) and ASCII case are ignored.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.content_type().eq_ignore_ascii_case(essence))
    }
}

/// Builds the on-disk file name `{id}.{ext}` for an attachment.
///
/// The extension is taken from the client's original file name. Names without
/// one, or whose extension is not plain ASCII alphanumerics, fall back to
/// [`DEFAULT_ATTACHMENT_EXTENSION`].
pub fn stored_file_name(id: &CandidateId, original_file_name: Option<&str>) -> String {
    let extension = original_file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(DEFAULT_ATTACHMENT_EXTENSION);
    format!("{}.{}", id.as_str(), extension)
}

// --- Skills ---

/// Splits a comma-separated skills string into trimmed, non-empty tokens.
/// Order is preserved and duplicates are kept.
pub fn parse_skill_set(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

// --- Candidate Profile (validated submission fields) ---

pub const FIELD_FULL_NAME: &str = "full_name";
pub const FIELD_DOB: &str = "dob";
pub const FIELD_CONTACT_NUMBER: &str = "contact_number";
pub const FIELD_CONTACT_ADDRESS: &str = "contact_address";
pub const FIELD_EDUCATION_QUALIFICATION: &str = "education_qualification";
pub const FIELD_GRADUATION_YEAR: &str = "graduation_year";
pub const FIELD_YEARS_OF_EXPERIENCE: &str = "years_of_experience";
pub const FIELD_SKILL_SET: &str = "skill_set";

/// All form fields a submission must carry, in declaration order.
pub const REQUIRED_FIELDS: [&str; 8] = [
    FIELD_FULL_NAME,
    FIELD_DOB,
    FIELD_CONTACT_NUMBER,
    FIELD_CONTACT_ADDRESS,
    FIELD_EDUCATION_QUALIFICATION,
    FIELD_GRADUATION_YEAR,
    FIELD_YEARS_OF_EXPERIENCE,
    FIELD_SKILL_SET,
];

/// The typed, validated part of a candidate submission (everything except the
/// identity and the attachment).
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProfile {
    pub full_name: String,
    pub dob: NaiveDate,
    pub contact_number: String,
    pub contact_address: String,
    pub education_qualification: String,
    pub graduation_year: i32,
    pub years_of_experience: f64,
    pub skill_set: Vec<String>,
}

impl CandidateProfile {
    /// Validates raw text fields (field name -> value) and builds a profile.
    /// Unknown field names are ignored.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, DomainError> {
        for name in REQUIRED_FIELDS {
            if !fields.contains_key(name) {
                return Err(DomainError::MissingField(name.to_string()));
            }
        }
        let text = |name: &str| fields.get(name).cloned().unwrap_or_default();

        Ok(Self {
            full_name: text(FIELD_FULL_NAME),
            dob: parse_dob(&text(FIELD_DOB))?,
            contact_number: text(FIELD_CONTACT_NUMBER),
            contact_address: text(FIELD_CONTACT_ADDRESS),
            education_qualification: text(FIELD_EDUCATION_QUALIFICATION),
            graduation_year: parse_graduation_year(&text(FIELD_GRADUATION_YEAR))?,
            years_of_experience: parse_years_of_experience(&text(FIELD_YEARS_OF_EXPERIENCE))?,
            skill_set: parse_skill_set(&text(FIELD_SKILL_SET)),
        })
    }
}

fn parse_dob(raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        DomainError::InvalidFieldValue {
            field: FIELD_DOB.to_string(),
            reason: format!("Expected a date in YYYY-MM-DD form, got '{}' ({})", raw, e),
        }
    })
}

fn parse_graduation_year(raw: &str) -> Result<i32, DomainError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DomainError::InvalidFieldValue {
            field: FIELD_GRADUATION_YEAR.to_string(),
            reason: format!("Expected an integer year, got '{}'", raw),
        })
}

fn parse_years_of_experience(raw: &str) -> Result<f64, DomainError> {
    let invalid = |reason: String| DomainError::InvalidFieldValue {
        field: FIELD_YEARS_OF_EXPERIENCE.to_string(),
        reason,
    };
    let years = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid(format!("Expected a number, got '{}'", raw)))?;
    if !years.is_finite() || years < 0.0 {
        return Err(invalid(format!(
            "Expected a non-negative number, got {}",
            years
        )));
    }
    Ok(years)
}

// --- Candidate Record ---

/// One candidate's stored submission. The record does not own its resume
/// file; `attachment_path` only points at it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Candidate {
    id: CandidateId,
    full_name: String,
    dob: NaiveDate,
    contact_number: String,
    contact_address: String,
    education_qualification: String,
    graduation_year: i32,
    years_of_experience: f64,
    skill_set: Vec<String>,
    #[serde(rename = "resume_file_path")]
    attachment_path: PathBuf,
}

impl Candidate {
    pub fn new(id: CandidateId, profile: CandidateProfile, attachment_path: PathBuf) -> Self {
        let CandidateProfile {
            full_name,
            dob,
            contact_number,
            contact_address,
            education_qualification,
            graduation_year,
            years_of_experience,
            skill_set,
        } = profile;
        Self {
            id,
            full_name,
            dob,
            contact_number,
            contact_address,
            education_qualification,
            graduation_year,
            years_of_experience,
            skill_set,
            attachment_path,
        }
    }

    pub fn id(&self) -> &CandidateId {
        &self.id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn dob(&self) -> NaiveDate {
        self.dob
    }

    pub fn contact_number(&self) -> &str {
        &self.contact_number
    }

    pub fn contact_address(&self) -> &str {
        &self.contact_address
    }

    pub fn education_qualification(&self) -> &str {
        &self.education_qualification
    }

    pub fn graduation_year(&self) -> i32 {
        self.graduation_year
    }

    pub fn years_of_experience(&self) -> f64 {
        self.years_of_experience
    }

    pub fn skill_set(&self) -> &[String] {
        &self.skill_set
    }

    pub fn attachment_path(&self) -> &Path {
        &self.attachment_path
    }
}
