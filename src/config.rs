// ============================================================================
// Event Store Configuration
// ============================================================================
//
// Tuning knobs for the persistence engine. Kept deliberately small: the
// engine has no caches and no background work, so the only things worth
// configuring are the streaming batch size and the read-path preference
// surfaced to callers.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct EventStoreConfig {
    /// Number of rows fetched per step of a streaming read
    pub streaming_batch_size: i64,
    /// Whether callers should prefer `open_stream` over loading an
    /// aggregate's full history in one query
    pub prefer_streaming: bool,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            streaming_batch_size: 200,
            prefer_streaming: false,
        }
    }
}

impl EventStoreConfig {
    pub fn with_streaming_batch_size(mut self, streaming_batch_size: i64) -> Self {
        self.streaming_batch_size = streaming_batch_size;
        self
    }

    pub fn with_prefer_streaming(mut self, prefer_streaming: bool) -> Self {
        self.prefer_streaming = prefer_streaming;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EventStoreConfig::default();
        assert_eq!(config.streaming_batch_size, 200);
        assert!(!config.prefer_streaming);
    }

    #[test]
    fn test_builder_style_overrides() {
        let config = EventStoreConfig::default()
            .with_streaming_batch_size(50)
            .with_prefer_streaming(true);

        assert_eq!(config.streaming_batch_size, 50);
        assert!(config.prefer_streaming);
    }
}
