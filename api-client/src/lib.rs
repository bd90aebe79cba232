//! Blocking HTTP client for the InkFrame device API
//!
//! This crate speaks the small REST protocol an InkFrame display uses to
//! stay in sync with its server: the periodic poll, bitmap downloads, mode
//! notifications and the registration/settings endpoints. Every call is
//! synchronous and bounded by the timeouts in [`ClientConfig`].
//!
//! ```no_run
//! use api_client::{ClientConfig, ContentDescriptor, InkframeClient};
//!
//! let client = InkframeClient::new(ClientConfig::new("http://192.168.1.100:3000"), "a1b2c3d4");
//! let bitmap = client.fetch_bitmap(ContentDescriptor::dashboard(), 5000)?;
//! assert_eq!(bitmap.bytes.len(), 5000);
//! # Ok::<(), api_client::FetchError>(())
//! ```

mod bitmap;
mod config;
mod error;
mod types;

pub use bitmap::read_frame;
pub use config::ClientConfig;
pub use error::{ClientError, FetchError, Result};
pub use types::{
    Bitmap, BitmapMeta, ContentDescriptor, ContentKind, DisplayMode, ImageInfo, PollRequest,
    PollResponse, Registration,
};

use tracing::{debug, info, warn};

use types::SetModeBody;

/// Client for one device's view of the API
#[derive(Debug, Clone)]
pub struct InkframeClient {
    agent: ureq::Agent,
    config: ClientConfig,
    device_id: String,
}

impl InkframeClient {
    /// Create a client for `device_id` against the configured server
    pub fn new(config: ClientConfig, device_id: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.bitmap_read_deadline)
            .user_agent(&format!("inkframe/{}", env!("CARGO_PKG_VERSION")))
            .build();

        Self {
            agent,
            config,
            device_id: device_id.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn device_url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/device/{}/{}",
            self.config.base_url, self.device_id, endpoint
        )
    }

    /// Ask the server what the display should be showing
    ///
    /// The request carries the device's refresh version, mode and image
    /// index so the server can diff against what the device last knew.
    pub fn poll(&self, request: &PollRequest) -> Result<PollResponse> {
        let url = self.device_url("poll");
        debug!(
            version = request.version,
            mode = request.mode.as_wire(),
            index = request.index,
            "polling server"
        );

        let response = self
            .agent
            .get(&url)
            .query("v", &request.version.to_string())
            .query("m", request.mode.as_wire())
            .query("i", &request.index.to_string())
            .timeout(self.config.poll_timeout)
            .call()
            .map_err(ClientError::from_ureq)?;

        let body = response
            .into_string()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        debug!(%body, "poll response");

        PollResponse::from_json(&body).map_err(|e| ClientError::Protocol(e.to_string()))
    }

    /// Download one bitmap of exactly `expected_len` bytes
    ///
    /// Metadata headers are read before the body and returned alongside the
    /// frame. The result is `Ok` only when the full frame arrived within
    /// the read deadline.
    pub fn fetch_bitmap(
        &self,
        descriptor: ContentDescriptor,
        expected_len: usize,
    ) -> std::result::Result<Bitmap, FetchError> {
        let url = self.device_url("bitmap");
        debug!(
            mode = descriptor.query_mode(),
            index = descriptor.index,
            "fetching bitmap"
        );

        let response = self
            .agent
            .get(&url)
            .query("index", &descriptor.index.to_string())
            .query("mode", descriptor.query_mode())
            .call()
            .map_err(FetchError::from_ureq)?;

        let meta = bitmap::read_meta(&response);
        if let Some(content_type) = &meta.content_type {
            debug!(%content_type, total = ?meta.total, "bitmap metadata");
        }

        if let Some(declared) = bitmap::declared_length(&response) {
            if declared != expected_len {
                warn!(declared, expected_len, "bitmap has wrong size");
                return Err(FetchError::SizeMismatch {
                    expected: expected_len,
                    actual: declared,
                });
            }
        }

        let bytes = read_frame(
            response.into_reader(),
            expected_len,
            self.config.bitmap_read_deadline,
        )?;
        debug!(len = bytes.len(), "bitmap received");

        Ok(Bitmap { bytes, meta })
    }

    /// Tell the server which mode the device switched to
    pub fn set_mode(&self, mode: DisplayMode) -> Result<()> {
        self.agent
            .post(&self.device_url("set-mode"))
            .timeout(self.config.notify_timeout)
            .send_json(SetModeBody { mode })
            .map_err(ClientError::from_ureq)?;

        info!(mode = mode.as_wire(), "server mode updated");
        Ok(())
    }

    /// Advance the server-side image index
    pub fn next_image(&self) -> Result<()> {
        self.agent
            .post(&self.device_url("next-image"))
            .timeout(self.config.settings_timeout)
            .send_string("")
            .map_err(ClientError::from_ureq)?;

        Ok(())
    }

    /// Fetch the legacy image settings
    pub fn image_info(&self) -> Result<ImageInfo> {
        let response = self
            .agent
            .get(&self.device_url("image-info"))
            .timeout(self.config.settings_timeout)
            .call()
            .map_err(ClientError::from_ureq)?;

        let body = response
            .into_string()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| ClientError::Protocol(e.to_string()))
    }

    /// Probe the server's health endpoint
    pub fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/health", self.config.base_url);
        self.agent
            .get(&url)
            .timeout(self.config.register_timeout)
            .call()
            .map_err(ClientError::from_ureq)?;

        Ok(())
    }

    /// Register this device with the server
    ///
    /// Both 200 and 201 count as success.
    pub fn register(&self, registration: &Registration) -> Result<()> {
        let url = format!("{}/api/devices/register", self.config.base_url);
        let response = self
            .agent
            .post(&url)
            .timeout(self.config.register_timeout)
            .send_json(registration)
            .map_err(ClientError::from_ureq)?;

        info!(
            status = response.status(),
            device_id = %registration.device_id,
            "device registered"
        );
        Ok(())
    }
}
