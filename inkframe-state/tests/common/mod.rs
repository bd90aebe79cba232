//! Shared test helpers: a scripted in-memory server

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Cursor;
use std::time::Duration;

use api_client::{
    read_frame, Bitmap, BitmapMeta, ClientError, ContentDescriptor, ContentKind, DisplayMode,
    FetchError, ImageInfo, PollRequest, PollResponse, Registration,
};
use inkframe_state::{DeviceApi, DeviceState};

/// How the fake answers a bitmap request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Serve {
    /// A full frame filled with this byte
    Frame(u8),
    /// The stream ends after this many bytes
    Truncated(usize),
    /// 404
    NotFound,
    /// 500
    Fail,
}

/// One request seen by the fake, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Poll(PollRequest),
    Fetch(ContentDescriptor),
    SetMode(DisplayMode),
    NextImage,
    ImageInfo,
    HealthCheck,
    Register(String),
}

pub struct FakeApi {
    frame_len: usize,
    /// `None` answers polls with a transport error
    pub poll: Option<PollResponse>,
    pub dashboard: Serve,
    pub photo: Serve,
    calls: RefCell<Vec<Call>>,
}

impl FakeApi {
    pub fn new(frame_len: usize) -> Self {
        Self {
            frame_len,
            poll: None,
            dashboard: Serve::Frame(0xFF),
            photo: Serve::Frame(0x00),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn fetches(&self) -> Vec<ContentDescriptor> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Fetch(descriptor) => Some(*descriptor),
                _ => None,
            })
            .collect()
    }

    pub fn modes_sent(&self) -> Vec<DisplayMode> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::SetMode(mode) => Some(*mode),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl DeviceApi for FakeApi {
    fn poll(&self, state: &DeviceState) -> Result<PollResponse, ClientError> {
        self.record(Call::Poll(state.poll_request()));
        self.poll
            .clone()
            .ok_or_else(|| ClientError::Transport("connection refused".to_string()))
    }

    fn fetch_bitmap(
        &self,
        descriptor: ContentDescriptor,
        expected_len: usize,
    ) -> Result<Bitmap, FetchError> {
        self.record(Call::Fetch(descriptor));
        assert_eq!(expected_len, self.frame_len);

        let serve = match descriptor.kind {
            ContentKind::Dashboard => self.dashboard,
            ContentKind::Photo => self.photo,
        };
        match serve {
            Serve::Frame(fill) => Ok(Bitmap {
                bytes: vec![fill; self.frame_len],
                meta: BitmapMeta::default(),
            }),
            Serve::Truncated(len) => {
                let body = vec![0x00; len];
                let bytes = read_frame(Cursor::new(body), expected_len, Duration::from_secs(10))?;
                Ok(Bitmap {
                    bytes,
                    meta: BitmapMeta::default(),
                })
            }
            Serve::NotFound => Err(FetchError::NoContentAvailable),
            Serve::Fail => Err(FetchError::Server(500)),
        }
    }

    fn set_mode(&self, mode: DisplayMode) -> Result<(), ClientError> {
        self.record(Call::SetMode(mode));
        Ok(())
    }

    fn next_image(&self) -> Result<(), ClientError> {
        self.record(Call::NextImage);
        Ok(())
    }

    fn image_info(&self) -> Result<ImageInfo, ClientError> {
        self.record(Call::ImageInfo);
        Err(ClientError::NotFound)
    }

    fn health_check(&self) -> Result<(), ClientError> {
        self.record(Call::HealthCheck);
        Ok(())
    }

    fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        self.record(Call::Register(registration.device_id.clone()));
        Ok(())
    }
}

/// A poll response in wire terms
pub fn response(r: bool, m: DisplayMode, v: i64, n: i64, i: i64, t: i64) -> PollResponse {
    PollResponse {
        should_refresh: r,
        mode: m,
        version: v,
        poll_interval_secs: n,
        index: i,
        total: t,
    }
}
