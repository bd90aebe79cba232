//! Client configuration
//!
//! Timeouts follow the device firmware defaults: polls give up after 10
//! seconds, bitmap connections after 15, and a bitmap body must finish
//! streaming within 10 seconds of the response head arriving.

use std::time::Duration;

/// Configuration for [`InkframeClient`](crate::InkframeClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API server, without a trailing slash
    /// Default: "https://www.eink-luvia.com"
    pub base_url: String,

    /// Connect timeout for every request
    /// Default: 15 seconds
    pub connect_timeout: Duration,

    /// Whole-request timeout for the poll endpoint
    /// Default: 10 seconds
    pub poll_timeout: Duration,

    /// Deadline for streaming a bitmap body, measured from the response head
    /// Default: 10 seconds
    pub bitmap_read_deadline: Duration,

    /// Whole-request timeout for set-mode notifications
    /// Default: 5 seconds
    pub notify_timeout: Duration,

    /// Whole-request timeout for next-image and image-info
    /// Default: 10 seconds
    pub settings_timeout: Duration,

    /// Whole-request timeout for the health check and registration
    /// Default: 15 seconds
    pub register_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.eink-luvia.com".to_string(),
            connect_timeout: Duration::from_secs(15),
            poll_timeout: Duration::from_secs(10),
            bitmap_read_deadline: Duration::from_secs(10),
            notify_timeout: Duration::from_secs(5),
            settings_timeout: Duration::from_secs(10),
            register_timeout: Duration::from_secs(15),
        }
    }
}

impl ClientConfig {
    /// Create a config with default timeouts for the given server
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_bitmap_read_deadline(mut self, deadline: Duration) -> Self {
        self.bitmap_read_deadline = deadline;
        self
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    pub fn with_settings_timeout(mut self, timeout: Duration) -> Self {
        self.settings_timeout = timeout;
        self
    }

    pub fn with_register_timeout(mut self, timeout: Duration) -> Self {
        self.register_timeout = timeout;
        self
    }

    /// Check the configuration for values that would make every request fail
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base URL must not be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }

        let timeouts = [
            ("connect_timeout", self.connect_timeout),
            ("poll_timeout", self.poll_timeout),
            ("bitmap_read_deadline", self.bitmap_read_deadline),
            ("notify_timeout", self.notify_timeout),
            ("settings_timeout", self.settings_timeout),
            ("register_timeout", self.register_timeout),
        ];
        for (name, value) in timeouts {
            if value.is_zero() {
                return Err(format!("{} must be greater than zero", name));
            }
        }

        Ok(())
    }
}
