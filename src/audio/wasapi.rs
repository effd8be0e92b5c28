//! Windows Core Audio (WASAPI) backend
//!
//! Enumerates sessions on the default render endpoint through
//! `IAudioSessionManager2` and reads the endpoint master volume through
//! `IAudioEndpointVolume`. COM interfaces are released when they drop; the
//! backend owns a [`ComGuard`] that uninitializes COM after everything else.

use super::{
    AudioBackend, AudioError, DataFlow, DeviceInfo, DeviceState, SessionControl, SessionState,
    VolumeLevel,
};
use tracing::{debug, warn};
use windows::core::{Interface, PWSTR};
use windows::Win32::Devices::FunctionDiscovery::PKEY_Device_FriendlyName;
use windows::Win32::Foundation::{CloseHandle, S_OK};
use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
use windows::Win32::Media::Audio::{
    eAll, eCapture, eConsole, eRender, AudioSessionStateActive, AudioSessionStateExpired,
    IAudioSessionControl, IAudioSessionControl2, IAudioSessionManager2, IMMDevice,
    IMMDeviceEnumerator, IMMEndpoint, ISimpleAudioVolume, MMDeviceEnumerator,
    DEVICE_STATEMASK_ALL, DEVICE_STATE_ACTIVE, DEVICE_STATE_DISABLED, DEVICE_STATE_NOTPRESENT,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, CLSCTX_ALL,
    COINIT_MULTITHREADED, STGM_READ,
};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};

fn os_error(op: &'static str) -> impl FnOnce(windows::core::Error) -> AudioError {
    move |e| AudioError::Os {
        op,
        message: e.to_string(),
    }
}

/// Copy a COM-allocated string and free the original
unsafe fn take_co_string(value: PWSTR) -> String {
    if value.is_null() {
        return String::new();
    }
    let text = value.to_string().unwrap_or_default();
    CoTaskMemFree(Some(value.0 as *const _));
    text
}

/// Keeps COM initialized on this thread for as long as it lives
pub struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    pub fn new() -> Result<Self, AudioError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        // S_FALSE: already initialized on this thread, still needs a matching uninit
        if hr.is_err() {
            return Err(AudioError::Os {
                op: "CoInitializeEx",
                message: format!("HRESULT {:#x}", hr.0),
            });
        }
        Ok(Self { initialized: true })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

/// Session access on the default render endpoint
pub struct WasapiBackend {
    enumerator: IMMDeviceEnumerator,
    device: IMMDevice,
    // Declared last so COM outlives the interfaces above
    _com: ComGuard,
}

impl WasapiBackend {
    pub fn new() -> Result<Self, AudioError> {
        let com = ComGuard::new()?;

        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                    .map_err(os_error("CoCreateInstance(MMDeviceEnumerator)"))?;

            let device = enumerator
                .GetDefaultAudioEndpoint(eRender, eConsole)
                .map_err(os_error("GetDefaultAudioEndpoint"))?;

            debug!("WASAPI backend opened on default render endpoint");

            Ok(Self {
                enumerator,
                device,
                _com: com,
            })
        }
    }
}

unsafe fn describe_device(device: &IMMDevice) -> Result<DeviceInfo, AudioError> {
    let id = take_co_string(device.GetId().map_err(os_error("IMMDevice::GetId"))?);

    let store = device
        .OpenPropertyStore(STGM_READ)
        .map_err(os_error("IMMDevice::OpenPropertyStore"))?;
    let name = match store.GetValue(&PKEY_Device_FriendlyName) {
        Ok(value) => value.to_string(),
        Err(e) => {
            warn!("No friendly name for device {}: {}", id, e);
            String::new()
        }
    };
    let name = if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    };

    let flow = match device.cast::<IMMEndpoint>().and_then(|e| e.GetDataFlow()) {
        Ok(flow) if flow == eCapture => DataFlow::Capture,
        _ => DataFlow::Render,
    };

    let state = match device.GetState().map_err(os_error("IMMDevice::GetState"))? {
        DEVICE_STATE_ACTIVE => DeviceState::Active,
        DEVICE_STATE_DISABLED => DeviceState::Disabled,
        DEVICE_STATE_NOTPRESENT => DeviceState::NotPresent,
        _ => DeviceState::Unplugged,
    };

    Ok(DeviceInfo {
        id,
        name,
        flow,
        state,
    })
}

impl AudioBackend for WasapiBackend {
    type Session = WasapiSession;

    fn default_device(&self) -> Result<DeviceInfo, AudioError> {
        unsafe { describe_device(&self.device) }
    }

    fn master_volume(&self) -> Result<VolumeLevel, AudioError> {
        unsafe {
            let endpoint_volume: IAudioEndpointVolume = self
                .device
                .Activate(CLSCTX_ALL, None)
                .map_err(os_error("Activate(IAudioEndpointVolume)"))?;
            let scalar = endpoint_volume
                .GetMasterVolumeLevelScalar()
                .map_err(os_error("GetMasterVolumeLevelScalar"))?;
            Ok(VolumeLevel::clamped(scalar))
        }
    }

    fn devices(&self) -> Result<Vec<DeviceInfo>, AudioError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(eAll, DEVICE_STATEMASK_ALL)
                .map_err(os_error("EnumAudioEndpoints"))?;
            let count = collection
                .GetCount()
                .map_err(os_error("IMMDeviceCollection::GetCount"))?;

            let mut devices = Vec::with_capacity(count as usize);
            for i in 0..count {
                let device = collection
                    .Item(i)
                    .map_err(os_error("IMMDeviceCollection::Item"))?;
                devices.push(describe_device(&device)?);
            }
            Ok(devices)
        }
    }

    fn sessions(&self) -> Result<Vec<WasapiSession>, AudioError> {
        unsafe {
            let manager: IAudioSessionManager2 = self
                .device
                .Activate(CLSCTX_ALL, None)
                .map_err(os_error("Activate(IAudioSessionManager2)"))?;
            let session_enum = manager
                .GetSessionEnumerator()
                .map_err(os_error("GetSessionEnumerator"))?;
            let count = session_enum
                .GetCount()
                .map_err(os_error("IAudioSessionEnumerator::GetCount"))?;

            let mut sessions = Vec::with_capacity(count.max(0) as usize);
            for i in 0..count {
                let control: IAudioSessionControl = session_enum
                    .GetSession(i)
                    .map_err(os_error("IAudioSessionEnumerator::GetSession"))?;
                sessions.push(WasapiSession::from_control(control)?);
            }
            debug!("Enumerated {} audio sessions", sessions.len());
            Ok(sessions)
        }
    }
}

/// One WASAPI session: control and simple-volume interfaces
pub struct WasapiSession {
    control: IAudioSessionControl2,
    volume: ISimpleAudioVolume,
}

impl WasapiSession {
    fn from_control(control: IAudioSessionControl) -> Result<Self, AudioError> {
        let control2: IAudioSessionControl2 = control
            .cast()
            .map_err(os_error("QueryInterface(IAudioSessionControl2)"))?;
        let volume: ISimpleAudioVolume = control
            .cast()
            .map_err(os_error("QueryInterface(ISimpleAudioVolume)"))?;
        Ok(Self {
            control: control2,
            volume,
        })
    }
}

impl SessionControl for WasapiSession {
    fn process_id(&self) -> Result<u32, AudioError> {
        unsafe {
            self.control
                .GetProcessId()
                .map_err(os_error("IAudioSessionControl2::GetProcessId"))
        }
    }

    fn display_name(&self) -> Result<String, AudioError> {
        unsafe {
            let name = self
                .control
                .GetDisplayName()
                .map_err(os_error("IAudioSessionControl::GetDisplayName"))?;
            Ok(take_co_string(name))
        }
    }

    fn process_name(&self) -> Option<String> {
        let pid = self.process_id().ok()?;
        if pid == 0 {
            return None;
        }
        process_image_name(pid)
    }

    fn state(&self) -> Result<SessionState, AudioError> {
        let state = unsafe {
            self.control
                .GetState()
                .map_err(os_error("IAudioSessionControl::GetState"))?
        };
        Ok(if state == AudioSessionStateActive {
            SessionState::Active
        } else if state == AudioSessionStateExpired {
            SessionState::Expired
        } else {
            SessionState::Inactive
        })
    }

    fn is_system_sounds(&self) -> Result<bool, AudioError> {
        // S_OK for the system sounds session, S_FALSE otherwise
        Ok(unsafe { self.control.IsSystemSoundsSession() } == S_OK)
    }

    fn volume(&self) -> Result<VolumeLevel, AudioError> {
        unsafe {
            self.volume
                .GetMasterVolume()
                .map(VolumeLevel::clamped)
                .map_err(os_error("ISimpleAudioVolume::GetMasterVolume"))
        }
    }

    fn set_volume(&self, level: VolumeLevel) -> Result<(), AudioError> {
        unsafe {
            self.volume
                .SetMasterVolume(level.as_f32(), std::ptr::null())
                .map_err(os_error("ISimpleAudioVolume::SetMasterVolume"))
        }
    }

    fn is_muted(&self) -> Result<bool, AudioError> {
        unsafe {
            self.volume
                .GetMute()
                .map(|muted| muted.as_bool())
                .map_err(os_error("ISimpleAudioVolume::GetMute"))
        }
    }

    fn set_mute(&self, mute: bool) -> Result<(), AudioError> {
        unsafe {
            self.volume
                .SetMute(mute, std::ptr::null())
                .map_err(os_error("ISimpleAudioVolume::SetMute"))
        }
    }
}

/// Executable base name for a process, e.g. `Spotify.exe`
pub(crate) fn process_image_name(pid: u32) -> Option<String> {
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;

        let mut path_buf = [0u16; 1024];
        let mut len = path_buf.len() as u32;
        let queried = QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_WIN32,
            PWSTR(path_buf.as_mut_ptr()),
            &mut len,
        );

        let _ = CloseHandle(handle);

        queried.ok()?;
        let path = String::from_utf16_lossy(&path_buf[..len as usize]);
        path.rsplit('\\').next().map(str::to_string)
    }
}
