//! UTM campaign parameters carried by links and clicks.

/// Optional UTM parameters. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

impl CampaignParams {
    pub fn new(
        utm_source: Option<String>,
        utm_medium: Option<String>,
        utm_campaign: Option<String>,
    ) -> Self {
        Self {
            utm_source: non_blank(utm_source),
            utm_medium: non_blank(utm_medium),
            utm_campaign: non_blank(utm_campaign),
        }
    }

    /// Query parameter pairs in link order, skipping absent values.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("utm_source", self.utm_source.as_deref()),
            ("utm_medium", self.utm_medium.as_deref()),
            ("utm_campaign", self.utm_campaign.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
