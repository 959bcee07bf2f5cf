use std::fmt;
use std::str::FromStr;

use tracing::warn;

/// Named step of an agent's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Homepage,
    Train,
    TrainChannels,
    Test,
    Search,
    Intervention,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Homepage => "homepage",
            Step::Train => "train",
            Step::TrainChannels => "train_channels",
            Step::Test => "test",
            Step::Search => "search",
            Step::Intervention => "intervention",
        }
    }

    /// Parse a comma-separated sequence. Unknown names are skipped with a
    /// warning so the remaining steps still run.
    pub fn parse_list(raw: &str) -> Vec<Step> {
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter_map(|name| match name.parse() {
                Ok(step) => Some(step),
                Err(err) => {
                    warn!("{}", err);
                    None
                }
            })
            .collect()
    }

    pub fn join(steps: &[Step]) -> String {
        steps
            .iter()
            .map(Step::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStep(pub String);

impl fmt::Display for UnknownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown step '{}', skipping", self.0)
    }
}

impl std::error::Error for UnknownStep {}

impl FromStr for Step {
    type Err = UnknownStep;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "homepage" | "fetch_homepage" => Ok(Step::Homepage),
            "train" => Ok(Step::Train),
            "train_channels" => Ok(Step::TrainChannels),
            "test" => Ok(Step::Test),
            "search" => Ok(Step::Search),
            "intervention" => Ok(Step::Intervention),
            _ => Err(UnknownStep(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_steps_are_skipped() {
        assert_eq!(
            Step::parse_list("train, dance ,test,,search"),
            vec![Step::Train, Step::Test, Step::Search]
        );
    }

    #[test]
    fn join_round_trips_through_parse() {
        let steps = [Step::TrainChannels, Step::Search];
        assert_eq!(Step::join(&steps), "train_channels,search");
        assert_eq!(Step::parse_list(&Step::join(&steps)), steps);
    }

    #[test]
    fn accepts_dashed_names() {
        assert_eq!("fetch-homepage".parse::<Step>(), Ok(Step::Homepage));
    }
}
