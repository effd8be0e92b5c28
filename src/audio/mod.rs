//! Audio devices and sessions
//!
//! The OS seam lives behind two traits: [`AudioBackend`] hands out the
//! default render device and point-in-time session lists, and
//! [`SessionControl`] is one short-lived session handle. The Windows
//! implementation talks to Core Audio (WASAPI); [`memory::MemoryBackend`]
//! keeps everything in process.

pub mod controller;
pub mod memory;
#[cfg(windows)]
pub mod wasapi;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub use controller::{
    apply_to_process, enumerate_applications, session_for_process, set_application_mute,
    set_application_volume, snapshot_sessions, VolumeAction,
};
pub use memory::MemoryBackend;

/// Audio layer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    #[error("Volume level {0} is outside 0.0..=1.0")]
    InvalidLevel(f32),

    #[error("{op} failed: {message}")]
    Os { op: &'static str, message: String },

    #[error("Audio session has expired")]
    SessionExpired,

    #[error("Audio sessions are only available on Windows")]
    Unsupported,
}

/// A volume scalar in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct VolumeLevel(f32);

impl VolumeLevel {
    pub const SILENT: VolumeLevel = VolumeLevel(0.0);
    pub const FULL: VolumeLevel = VolumeLevel(1.0);

    /// Validate a level. NaN and anything outside `0.0..=1.0` is rejected.
    pub fn new(value: f32) -> Result<Self, AudioError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AudioError::InvalidLevel(value))
        }
    }

    /// Clamp a level read back from the OS, which may drift by float error.
    /// NaN maps to silence.
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            Self::SILENT
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn as_f32(self) -> f32 {
        self.0
    }

    /// Rounded percentage, as shown in the Windows volume mixer
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Endpoint data flow direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFlow {
    Render,
    Capture,
}

/// Endpoint state as reported by the device enumerator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Active,
    Disabled,
    NotPresent,
    Unplugged,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceState::Active => "Active",
            DeviceState::Disabled => "Disabled",
            DeviceState::NotPresent => "Not present",
            DeviceState::Unplugged => "Unplugged",
        };
        f.write_str(s)
    }
}

/// Audio endpoint information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    /// Endpoint ID string (stable across reboots)
    pub id: String,

    /// Friendly name, e.g. "Speakers (Realtek High Definition Audio)"
    pub name: String,

    pub flow: DataFlow,

    pub state: DeviceState,
}

/// Audio session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Inactive,
    Active,
    Expired,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Inactive => "Inactive",
            SessionState::Active => "Active",
            SessionState::Expired => "Expired",
        };
        f.write_str(s)
    }
}

/// Point-in-time copy of a session's fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub pid: u32,
    pub display_name: String,
    pub process_name: Option<String>,
    pub state: SessionState,
    pub volume: VolumeLevel,
    pub muted: bool,
    pub system_sounds: bool,
}

impl SessionInfo {
    /// Name to show for this session.
    ///
    /// Falls back to the process name when the display name is empty or an
    /// indirect resource string (`@%SystemRoot%\...`).
    pub fn label(&self) -> String {
        if !self.display_name.is_empty() && !self.display_name.starts_with('@') {
            return self.display_name.clone();
        }
        match &self.process_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("PID {}", self.pid),
        }
    }
}

/// One audio session handle
///
/// Handles are cheap and short-lived. Dropping one releases the underlying
/// OS objects.
pub trait SessionControl {
    fn process_id(&self) -> Result<u32, AudioError>;
    fn display_name(&self) -> Result<String, AudioError>;

    /// Executable name of the owning process, if it can be resolved
    fn process_name(&self) -> Option<String>;

    fn state(&self) -> Result<SessionState, AudioError>;
    fn is_system_sounds(&self) -> Result<bool, AudioError>;

    fn volume(&self) -> Result<VolumeLevel, AudioError>;
    fn set_volume(&self, level: VolumeLevel) -> Result<(), AudioError>;

    fn is_muted(&self) -> Result<bool, AudioError>;
    fn set_mute(&self, mute: bool) -> Result<(), AudioError>;

    /// Read every field into a [`SessionInfo`]
    fn snapshot(&self) -> Result<SessionInfo, AudioError> {
        Ok(SessionInfo {
            pid: self.process_id()?,
            display_name: self.display_name()?,
            process_name: self.process_name(),
            state: self.state()?,
            volume: self.volume()?,
            muted: self.is_muted()?,
            system_sounds: self.is_system_sounds()?,
        })
    }
}

/// Access to the default render device and its sessions
pub trait AudioBackend {
    type Session: SessionControl;

    /// Default render endpoint for the console role
    fn default_device(&self) -> Result<DeviceInfo, AudioError>;

    /// Master volume scalar of the default render endpoint
    fn master_volume(&self) -> Result<VolumeLevel, AudioError>;

    /// All endpoints, every data flow and every state
    fn devices(&self) -> Result<Vec<DeviceInfo>, AudioError>;

    /// Sessions on the default render endpoint as of this call
    fn sessions(&self) -> Result<Vec<Self::Session>, AudioError>;
}
