/// Default in-memory bound for multipart bodies (32 MiB)
pub const DEFAULT_MULTIPART_MAX_BYTES: usize = 32 << 20;

/// Request binding configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindConfig {
    /// Upper bound on the bytes read from a request body
    pub multipart_max_bytes: usize,
    /// Whether form binding also sees query string values
    pub merge_query: bool,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            multipart_max_bytes: DEFAULT_MULTIPART_MAX_BYTES,
            merge_query: true,
        }
    }
}

impl BindConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(max_str) = lookup("BIND_MULTIPART_MAX_BYTES") {
            match max_str.trim().parse::<usize>() {
                Ok(max) if max > 0 => config.multipart_max_bytes = max,
                _ => tracing::warn!(
                    value = %max_str,
                    "ignoring invalid BIND_MULTIPART_MAX_BYTES"
                ),
            }
        }

        if let Some(merge_str) = lookup("BIND_MERGE_QUERY") {
            match merge_str.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => config.merge_query = true,
                "false" | "0" | "no" => config.merge_query = false,
                _ => tracing::warn!(value = %merge_str, "ignoring invalid BIND_MERGE_QUERY"),
            }
        }

        tracing::info!(
            "Bind config loaded: multipart_max_bytes={}, merge_query={}",
            config.multipart_max_bytes,
            config.merge_query
        );

        config
    }
}
