//! Collaborator seams
//!
//! The state machine reaches the server, the panel and the hardware
//! identity only through these traits, so it can run against fakes.

use api_client::{
    Bitmap, ClientError, ContentDescriptor, DisplayMode, FetchError, ImageInfo, InkframeClient,
    PollResponse, Registration,
};

use crate::buffer::ImageBuffer;
use crate::error::PresentError;
use crate::model::DeviceState;

/// The device API as seen by the state machine
#[cfg_attr(test, mockall::automock)]
pub trait DeviceApi {
    /// Reconciliation request carrying the current state
    fn poll(&self, state: &DeviceState) -> Result<PollResponse, ClientError>;

    /// One complete bitmap of exactly `expected_len` bytes
    fn fetch_bitmap(
        &self,
        descriptor: ContentDescriptor,
        expected_len: usize,
    ) -> Result<Bitmap, FetchError>;

    fn set_mode(&self, mode: DisplayMode) -> Result<(), ClientError>;

    fn next_image(&self) -> Result<(), ClientError>;

    fn image_info(&self) -> Result<ImageInfo, ClientError>;

    fn health_check(&self) -> Result<(), ClientError>;

    fn register(&self, registration: &Registration) -> Result<(), ClientError>;
}

impl DeviceApi for InkframeClient {
    fn poll(&self, state: &DeviceState) -> Result<PollResponse, ClientError> {
        InkframeClient::poll(self, &state.poll_request())
    }

    fn fetch_bitmap(
        &self,
        descriptor: ContentDescriptor,
        expected_len: usize,
    ) -> Result<Bitmap, FetchError> {
        InkframeClient::fetch_bitmap(self, descriptor, expected_len)
    }

    fn set_mode(&self, mode: DisplayMode) -> Result<(), ClientError> {
        InkframeClient::set_mode(self, mode)
    }

    fn next_image(&self) -> Result<(), ClientError> {
        InkframeClient::next_image(self)
    }

    fn image_info(&self) -> Result<ImageInfo, ClientError> {
        InkframeClient::image_info(self)
    }

    fn health_check(&self) -> Result<(), ClientError> {
        InkframeClient::health_check(self)
    }

    fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        InkframeClient::register(self, registration)
    }
}

/// Shows committed frames on the physical surface
pub trait FramePresenter {
    fn present(&mut self, frame: &ImageBuffer) -> Result<(), PresentError>;
}

/// Supplies the device's stable hexadecimal identity
pub trait DeviceIdProvider {
    fn device_id(&self) -> String;
}

/// A fixed identity, e.g. from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDeviceId(pub String);

impl DeviceIdProvider for StaticDeviceId {
    fn device_id(&self) -> String {
        self.0.clone()
    }
}
