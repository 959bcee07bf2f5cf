use serde::{Deserialize, Serialize};

/// One entry of an agent's append-only action log.
///
/// Serialized as `{"action": <kind>, "params": <payload>}`; kinds without a
/// payload omit `params`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum ActionRecord {
    /// Homepage listing, ids in page order.
    GetHomepage(Vec<String>),
    /// Up-next recommendations on the current watch page.
    GetRecommendations(Vec<String>),
    /// Search results, already bounded to the configured maximum.
    SearchResults(Vec<String>),
    /// Recommendations collected after watching the first search result.
    SearchRecommendations(Vec<String>),
    /// A completed watch of one item.
    Watch(String),
    /// An item that could not be watched and was skipped.
    WatchSkipped { id: String, reason: String },
    TrainingStart,
    TrainingEnd,
    ChannelTrainingStart,
    ChannelTrainingEnd {
        channels_processed: usize,
        videos_watched: usize,
    },
    TestingStart,
    TestingEnd,
    SearchStart,
    SearchEnd,
    InterventionStart,
    InterventionEnd,
}

impl ActionRecord {
    /// Log kind as written under `action`.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionRecord::GetHomepage(_) => "get_homepage",
            ActionRecord::GetRecommendations(_) => "get_recommendations",
            ActionRecord::SearchResults(_) => "search_results",
            ActionRecord::SearchRecommendations(_) => "search_recommendations",
            ActionRecord::Watch(_) => "watch",
            ActionRecord::WatchSkipped { .. } => "watch_skipped",
            ActionRecord::TrainingStart => "training_start",
            ActionRecord::TrainingEnd => "training_end",
            ActionRecord::ChannelTrainingStart => "channel_training_start",
            ActionRecord::ChannelTrainingEnd { .. } => "channel_training_end",
            ActionRecord::TestingStart => "testing_start",
            ActionRecord::TestingEnd => "testing_end",
            ActionRecord::SearchStart => "search_start",
            ActionRecord::SearchEnd => "search_end",
            ActionRecord::InterventionStart => "intervention_start",
            ActionRecord::InterventionEnd => "intervention_end",
        }
    }

    pub fn is_watch(&self) -> bool {
        matches!(self, ActionRecord::Watch(_))
    }

    /// Id list carried by listing kinds.
    pub fn ids(&self) -> Option<&[String]> {
        match self {
            ActionRecord::GetHomepage(ids)
            | ActionRecord::GetRecommendations(ids)
            | ActionRecord::SearchResults(ids)
            | ActionRecord::SearchRecommendations(ids) => Some(ids),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn watch_serializes_with_single_id() {
        let value = serde_json::to_value(ActionRecord::Watch("abc".into())).unwrap();
        assert_eq!(value, json!({ "action": "watch", "params": "abc" }));
    }

    #[test]
    fn listing_payload_is_an_id_array() {
        let record = ActionRecord::SearchResults(vec!["a".into(), "b".into()]);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["action"], "search_results");
        assert_eq!(value["params"], json!(["a", "b"]));
        assert_eq!(record.kind(), "search_results");
    }

    #[test]
    fn counts_payload_reads_back() {
        let raw = json!({
            "action": "channel_training_end",
            "params": { "channels_processed": 3, "videos_watched": 7 }
        });
        let record: ActionRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(
            record,
            ActionRecord::ChannelTrainingEnd {
                channels_processed: 3,
                videos_watched: 7
            }
        );
    }
}
