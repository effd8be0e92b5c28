//! In-memory audio backend
//!
//! Holds one default render device and a list of sessions. Session handles
//! share state with the backend, so a volume written through a handle is
//! visible to the next enumeration, the same way it is with the OS mixer.

use super::{
    AudioBackend, AudioError, DataFlow, DeviceInfo, DeviceState, SessionControl, SessionInfo,
    SessionState, VolumeLevel,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

struct SessionRecord {
    key: u64,
    info: SessionInfo,
}

struct MemoryState {
    default_device: DeviceInfo,
    master_volume: VolumeLevel,
    extra_devices: Vec<DeviceInfo>,
    sessions: Vec<SessionRecord>,
    next_key: u64,
}

impl MemoryState {
    fn record(&self, key: u64) -> Result<&SessionInfo, AudioError> {
        self.sessions
            .iter()
            .find(|r| r.key == key)
            .map(|r| &r.info)
            .ok_or(AudioError::SessionExpired)
    }

    fn record_mut(&mut self, key: u64) -> Result<&mut SessionInfo, AudioError> {
        self.sessions
            .iter_mut()
            .find(|r| r.key == key)
            .map(|r| &mut r.info)
            .ok_or(AudioError::SessionExpired)
    }
}

/// Audio backend backed by plain data
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    /// Create a backend with an active default render device
    pub fn new(device_name: impl Into<String>, master_volume: VolumeLevel) -> Self {
        let name = device_name.into();
        let default_device = DeviceInfo {
            id: format!("memory:{}", name.to_lowercase().replace(' ', "-")),
            name,
            flow: DataFlow::Render,
            state: DeviceState::Active,
        };

        Self {
            state: Arc::new(Mutex::new(MemoryState {
                default_device,
                master_volume,
                extra_devices: Vec::new(),
                sessions: Vec::new(),
                next_key: 1,
            })),
        }
    }

    /// Add a session owned by `pid` at the given volume
    pub fn with_session(self, pid: u32, name: &str, volume: f32) -> Self {
        self.add_session(SessionInfo {
            pid,
            display_name: String::new(),
            process_name: Some(name.to_string()),
            state: SessionState::Active,
            volume: VolumeLevel::clamped(volume),
            muted: false,
            system_sounds: false,
        });
        self
    }

    /// Add a non-default endpoint to the device list
    pub fn with_device(self, device: DeviceInfo) -> Self {
        self.state.lock().extra_devices.push(device);
        self
    }

    pub fn add_session(&self, info: SessionInfo) {
        let mut state = self.state.lock();
        let key = state.next_key;
        state.next_key += 1;
        debug!("Memory session {} added for PID {}", key, info.pid);
        state.sessions.push(SessionRecord { key, info });
    }

    /// Remove every session owned by `pid`, returning how many went away
    pub fn remove_sessions(&self, pid: u32) -> usize {
        let mut state = self.state.lock();
        let before = state.sessions.len();
        state.sessions.retain(|r| r.info.pid != pid);
        before - state.sessions.len()
    }

    pub fn set_master_volume(&self, level: VolumeLevel) {
        self.state.lock().master_volume = level;
    }

    /// Current state of the first session owned by `pid`
    pub fn session_info(&self, pid: u32) -> Option<SessionInfo> {
        self.state
            .lock()
            .sessions
            .iter()
            .find(|r| r.info.pid == pid)
            .map(|r| r.info.clone())
    }
}

impl AudioBackend for MemoryBackend {
    type Session = MemorySession;

    fn default_device(&self) -> Result<DeviceInfo, AudioError> {
        Ok(self.state.lock().default_device.clone())
    }

    fn master_volume(&self) -> Result<VolumeLevel, AudioError> {
        Ok(self.state.lock().master_volume)
    }

    fn devices(&self) -> Result<Vec<DeviceInfo>, AudioError> {
        let state = self.state.lock();
        let mut devices = vec![state.default_device.clone()];
        devices.extend(state.extra_devices.iter().cloned());
        Ok(devices)
    }

    fn sessions(&self) -> Result<Vec<MemorySession>, AudioError> {
        let state = self.state.lock();
        Ok(state
            .sessions
            .iter()
            .map(|r| MemorySession {
                state: Arc::clone(&self.state),
                key: r.key,
            })
            .collect())
    }
}

/// Handle to one in-memory session
pub struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
    key: u64,
}

impl MemorySession {
    fn read<T>(&self, f: impl FnOnce(&SessionInfo) -> T) -> Result<T, AudioError> {
        let state = self.state.lock();
        Ok(f(state.record(self.key)?))
    }
}

impl SessionControl for MemorySession {
    fn process_id(&self) -> Result<u32, AudioError> {
        self.read(|info| info.pid)
    }

    fn display_name(&self) -> Result<String, AudioError> {
        self.read(|info| info.display_name.clone())
    }

    fn process_name(&self) -> Option<String> {
        self.read(|info| info.process_name.clone()).ok().flatten()
    }

    fn state(&self) -> Result<SessionState, AudioError> {
        self.read(|info| info.state)
    }

    fn is_system_sounds(&self) -> Result<bool, AudioError> {
        self.read(|info| info.system_sounds)
    }

    fn volume(&self) -> Result<VolumeLevel, AudioError> {
        self.read(|info| info.volume)
    }

    fn set_volume(&self, level: VolumeLevel) -> Result<(), AudioError> {
        let mut state = self.state.lock();
        state.record_mut(self.key)?.volume = level;
        Ok(())
    }

    fn is_muted(&self) -> Result<bool, AudioError> {
        self.read(|info| info.muted)
    }

    fn set_mute(&self, mute: bool) -> Result<(), AudioError> {
        let mut state = self.state.lock();
        state.record_mut(self.key)?.muted = mute;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_writes_are_shared() {
        let backend = MemoryBackend::new("Speakers", VolumeLevel::FULL).with_session(7, "a.exe", 0.2);

        let sessions = backend.sessions().unwrap();
        sessions[0].set_volume(VolumeLevel::new(0.8).unwrap()).unwrap();

        assert_eq!(backend.session_info(7).unwrap().volume.as_f32(), 0.8);
    }

    #[test]
    fn test_removed_session_expires_handle() {
        let backend = MemoryBackend::new("Speakers", VolumeLevel::FULL).with_session(7, "a.exe", 0.2);
        let sessions = backend.sessions().unwrap();

        assert_eq!(backend.remove_sessions(7), 1);
        assert_eq!(sessions[0].volume(), Err(AudioError::SessionExpired));
        assert_eq!(sessions[0].process_name(), None);
    }

    #[test]
    fn test_devices_start_with_default() {
        let backend = MemoryBackend::new("Speakers", VolumeLevel::FULL).with_device(DeviceInfo {
            id: "mic".to_string(),
            name: "Microphone".to_string(),
            flow: DataFlow::Capture,
            state: DeviceState::Unplugged,
        });

        let devices = backend.devices().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0], backend.default_device().unwrap());
        assert_eq!(devices[1].flow, DataFlow::Capture);
    }
}
