use domain::Candidate;
use serde::Deserialize;

/// Optional listing constraints. Absent fields impose nothing; present ones
/// combine with logical AND.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct CandidateFilter {
    /// Case-insensitive substring matched against each skill.
    pub skill: Option<String>,
    /// Inclusive lower bound on years of experience.
    pub min_experience: Option<f64>,
    /// Exact graduation year.
    pub graduation_year: Option<i32>,
}

impl CandidateFilter {
    /// An empty `skill` string counts as absent.
    fn skill_needle(&self) -> Option<String> {
        self.skill
            .as_deref()
            .filter(|skill| !skill.is_empty())
            .map(str::to_lowercase)
    }

    pub fn is_empty(&self) -> bool {
        self.skill_needle().is_none()
            && self.min_experience.is_none()
            && self.graduation_year.is_none()
    }

    /// `skill_needle` must already be lowercased.
    fn matches_with(&self, candidate: &Candidate, skill_needle: Option<&str>) -> bool {
        if let Some(needle) = skill_needle {
            let has_skill = candidate
                .skill_set()
                .iter()
                .any(|skill| skill.to_lowercase().contains(needle));
            if !has_skill {
                return false;
            }
        }
        if let Some(min) = self.min_experience {
            if !(candidate.years_of_experience() >= min) {
                return false;
            }
        }
        if let Some(year) = self.graduation_year {
            if candidate.graduation_year() != year {
                return false;
            }
        }
        true
    }
}

/// Applies `filter` to `candidates`, keeping their order. Pure: nothing is
/// mutated, the input is consumed and the survivors returned.
pub fn filter_candidates<I>(candidates: I, filter: &CandidateFilter) -> Vec<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    if filter.is_empty() {
        return candidates.into_iter().collect();
    }
    let needle = filter.skill_needle();
    candidates
        .into_iter()
        .filter(|candidate| filter.matches_with(candidate, needle.as_deref()))
        .collect()
}
