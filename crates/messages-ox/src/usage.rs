use serde::{Deserialize, Serialize};

/// Token accounting for one response.
///
/// Every field is optional because a stream reports usage in two partial
/// installments: the `message_start` shell and the `message_delta` update.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation: Option<CacheCreation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_tool_use: Option<ServerToolUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_tier: Option<String>,
}

/// Cache writes split by time-to-live.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheCreation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_5m_input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_1h_input_tokens: Option<u32>,
}

impl CacheCreation {
    pub fn total(&self) -> u32 {
        self.ephemeral_5m_input_tokens
            .unwrap_or(0)
            .saturating_add(self.ephemeral_1h_input_tokens.unwrap_or(0))
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerToolUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_search_requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_fetch_requests: Option<u32>,
}

impl Usage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlays every field `update` reports onto `self`. Fields absent from
    /// `update` keep their current value.
    pub fn merge(&mut self, update: Usage) {
        fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        overlay(&mut self.input_tokens, update.input_tokens);
        overlay(&mut self.output_tokens, update.output_tokens);
        overlay(
            &mut self.cache_creation_input_tokens,
            update.cache_creation_input_tokens,
        );
        overlay(&mut self.cache_read_input_tokens, update.cache_read_input_tokens);
        overlay(&mut self.cache_creation, update.cache_creation);
        overlay(&mut self.server_tool_use, update.server_tool_use);
        overlay(&mut self.service_tier, update.service_tier);
    }

    /// Input plus output tokens, saturating at `u32::MAX`.
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens
            .unwrap_or(0)
            .saturating_add(self.output_tokens.unwrap_or(0))
    }

    /// Uncached, cache-written and cache-read input tokens, saturating at
    /// `u32::MAX`.
    pub fn total_input_tokens(&self) -> u32 {
        self.input_tokens
            .unwrap_or(0)
            .saturating_add(self.cache_creation_tokens())
            .saturating_add(self.cache_read_input_tokens.unwrap_or(0))
    }

    /// Tokens written to the prompt cache.
    ///
    /// Prefers the per-TTL breakdown and only falls back to the legacy
    /// `cache_creation_input_tokens` aggregate when no breakdown was sent.
    /// A breakdown of all zeroes is still taken as authoritative.
    pub fn cache_creation_tokens(&self) -> u32 {
        match &self.cache_creation {
            Some(breakdown) => breakdown.total(),
            None => self.cache_creation_input_tokens.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overrides_reported_fields_only() {
        let mut usage: Usage = serde_json::from_value(json!({
            "input_tokens": 25,
            "output_tokens": 1,
            "cache_read_input_tokens": 10
        }))
        .unwrap();

        usage.merge(serde_json::from_value(json!({"output_tokens": 15})).unwrap());

        assert_eq!(usage.input_tokens, Some(25));
        assert_eq!(usage.output_tokens, Some(15));
        assert_eq!(usage.cache_read_input_tokens, Some(10));
    }

    #[test]
    fn test_cache_creation_prefers_breakdown() {
        let usage: Usage = serde_json::from_value(json!({
            "cache_creation_input_tokens": 999,
            "cache_creation": {"ephemeral_5m_input_tokens": 100, "ephemeral_1h_input_tokens": 20}
        }))
        .unwrap();
        assert_eq!(usage.cache_creation_tokens(), 120);
    }

    #[test]
    fn test_cache_creation_falls_back_to_aggregate() {
        let usage: Usage =
            serde_json::from_value(json!({"cache_creation_input_tokens": 42})).unwrap();
        assert_eq!(usage.cache_creation_tokens(), 42);
        assert_eq!(Usage::new().cache_creation_tokens(), 0);
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let usage = Usage {
            input_tokens: Some(3),
            ..Usage::default()
        };
        assert_eq!(serde_json::to_value(&usage).unwrap(), json!({"input_tokens": 3}));
    }

    #[test]
    fn test_totals_saturate_on_huge_counts() {
        let usage: Usage = serde_json::from_value(json!({
            "input_tokens": u32::MAX,
            "output_tokens": 1,
            "cache_read_input_tokens": 7,
            "cache_creation": {
                "ephemeral_5m_input_tokens": u32::MAX,
                "ephemeral_1h_input_tokens": u32::MAX
            }
        }))
        .unwrap();

        assert_eq!(usage.total_tokens(), u32::MAX);
        assert_eq!(usage.cache_creation_tokens(), u32::MAX);
        assert_eq!(usage.total_input_tokens(), u32::MAX);
    }
}
