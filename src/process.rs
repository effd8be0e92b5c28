//! Processes with visible windows
//!
//! The normalization pass only touches applications the user can see, the
//! way the Task Manager "Apps" group does: any process owning a visible,
//! titled top-level window.

use crate::audio::AudioError;
use serde::Serialize;
use std::collections::HashSet;

/// A process owning at least one visible top-level window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowedProcess {
    pub pid: u32,
    pub name: String,
}

/// Rules applied to raw window owners before they are returned
#[derive(Debug, Clone, Default)]
pub struct ProcessFilter {
    /// Executable names to leave alone (case-insensitive)
    pub excluded: Vec<String>,
    /// Drop shell host processes (Start menu, search, lock screen, ...)
    pub skip_shell: bool,
}

impl ProcessFilter {
    /// Filter raw `(pid, executable name)` pairs.
    ///
    /// Drops the idle and system PIDs, duplicates, shell hosts (when
    /// enabled) and excluded names, then sorts by name.
    pub fn apply(
        &self,
        owners: impl IntoIterator<Item = (u32, Option<String>)>,
    ) -> Vec<WindowedProcess> {
        let excluded: HashSet<String> = self.excluded.iter().map(|n| n.to_lowercase()).collect();
        let mut seen_pids = HashSet::new();
        let mut processes = Vec::new();

        for (pid, name) in owners {
            if pid == 0 || pid == 4 || !seen_pids.insert(pid) {
                continue;
            }

            let name = name.unwrap_or_else(|| format!("PID {}", pid));
            let name_lower = name.to_lowercase();
            if self.skip_shell && is_shell_process(&name_lower) {
                continue;
            }
            if excluded.contains(&name_lower) {
                continue;
            }

            processes.push(WindowedProcess { pid, name });
        }

        processes.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.pid.cmp(&b.pid))
        });
        processes
    }
}

/// Shell processes that own windows but are not user applications
fn is_shell_process(name: &str) -> bool {
    matches!(
        name,
        "applicationframehost.exe"
            | "shellexperiencehost.exe"
            | "searchhost.exe"
            | "startmenuexperiencehost.exe"
            | "textinputhost.exe"
            | "lockapp.exe"
            | "systemsettings.exe"
    )
}

/// Source of windowed processes
pub trait ProcessSource {
    fn windowed_processes(&self) -> Result<Vec<WindowedProcess>, AudioError>;
}

impl ProcessSource for [WindowedProcess] {
    fn windowed_processes(&self) -> Result<Vec<WindowedProcess>, AudioError> {
        Ok(self.to_vec())
    }
}

/// Top-level windows on the current desktop
pub struct DesktopWindows {
    filter: ProcessFilter,
}

impl DesktopWindows {
    pub fn new(filter: ProcessFilter) -> Self {
        Self { filter }
    }
}

impl ProcessSource for DesktopWindows {
    #[cfg(windows)]
    fn windowed_processes(&self) -> Result<Vec<WindowedProcess>, AudioError> {
        let pids = windows_impl::window_owner_pids()?;
        let owners = pids
            .into_iter()
            .map(|pid| (pid, crate::audio::wasapi::process_image_name(pid)));
        Ok(self.filter.apply(owners))
    }

    #[cfg(not(windows))]
    fn windowed_processes(&self) -> Result<Vec<WindowedProcess>, AudioError> {
        let _ = &self.filter;
        Err(AudioError::Unsupported)
    }
}

#[cfg(windows)]
mod windows_impl {
    use crate::audio::AudioError;
    use windows::Win32::Foundation::{BOOL, HWND, LPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowTextLengthW, GetWindowThreadProcessId, IsWindowVisible,
    };

    /// PIDs owning visible, titled top-level windows, in z-order
    pub(super) fn window_owner_pids() -> Result<Vec<u32>, AudioError> {
        let mut pids: Vec<u32> = Vec::new();
        unsafe {
            EnumWindows(
                Some(enum_windows_callback),
                LPARAM(&mut pids as *mut Vec<u32> as isize),
            )
            .map_err(|e| AudioError::Os {
                op: "EnumWindows",
                message: e.to_string(),
            })?;
        }
        Ok(pids)
    }

    unsafe extern "system" fn enum_windows_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let pids = &mut *(lparam.0 as *mut Vec<u32>);

        if !IsWindowVisible(hwnd).as_bool() || GetWindowTextLengthW(hwnd) == 0 {
            return BOOL(1);
        }

        let mut pid: u32 = 0;
        GetWindowThreadProcessId(hwnd, Some(&mut pid));
        if pid != 0 {
            pids.push(pid);
        }

        BOOL(1)
    }
}
