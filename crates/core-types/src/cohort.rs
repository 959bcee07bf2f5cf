use std::fmt;

use serde::{Deserialize, Serialize};

/// Named behavioural group of agents.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CohortLabel(pub String);

impl CohortLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CohortLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cohort plus the source-data labels that belong to it.
///
/// Channel tables label rows in whatever language they were curated in; a
/// row belongs to the cohort when its label equals the cohort name or one of
/// the aliases, ignoring case and surrounding whitespace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CohortSpec {
    pub label: CohortLabel,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CohortSpec {
    pub fn new(label: impl Into<String>, aliases: &[&str]) -> Self {
        Self {
            label: CohortLabel::new(label),
            aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
        }
    }

    pub fn matches(&self, source_label: &str) -> bool {
        let wanted = source_label.trim().to_lowercase();
        if wanted.is_empty() {
            return false;
        }
        std::iter::once(self.label.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .any(|candidate| candidate.trim().to_lowercase() == wanted)
    }

    /// Default cohort matching `filter`, or a bare cohort named after it.
    pub fn resolve(filter: &str) -> CohortSpec {
        Self::defaults()
            .into_iter()
            .find(|spec| spec.matches(filter))
            .unwrap_or_else(|| CohortSpec::new(filter.trim(), &[]))
    }

    /// The four political cohorts used by default.
    pub fn defaults() -> Vec<CohortSpec> {
        vec![
            CohortSpec::new("Left", &["left", "gauche"]),
            CohortSpec::new(
                "RadicalLeft",
                &["radicalleft", "radical left", "gauche radicale"],
            ),
            CohortSpec::new("Right", &["right", "droite"]),
            CohortSpec::new(
                "ExtremeRight",
                &[
                    "extremeright",
                    "extreme right",
                    "droite extrême",
                    "droite extreme",
                ],
            ),
        ]
    }
}
