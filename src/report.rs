//! Console report formatting
//!
//! Pure string builders so the command layer can write into any `Write`.

use crate::audio::{DeviceInfo, SessionInfo, VolumeAction, VolumeLevel};
use crate::raise::{Outcome, ProcessOutcome};
use colored::*;

pub fn device_header(device: &DeviceInfo, master: VolumeLevel) -> String {
    format!(
        "{} {}\n{} {}",
        "Default Render Device:".bold(),
        device.name.cyan(),
        "Master Volume:".bold(),
        master.to_string().green()
    )
}

/// Multi-line block for one session: name, state, volume and mute flag
pub fn session_block(session: &SessionInfo) -> String {
    let mut block = format!(
        "{} {}\n\t- State: {}\n\t- Volume: {}",
        session.label().bright_white(),
        format!("(PID {})", session.pid).dimmed(),
        session.state,
        session.volume
    );
    if session.muted {
        block.push_str(&format!(" {}", "(muted)".yellow()));
    }
    if session.system_sounds {
        block.push_str(&format!("\n\t- {}", "System sounds".dimmed()));
    }
    block
}

pub fn device_line(device: &DeviceInfo, is_default: bool) -> String {
    let marker = if is_default {
        "*".green().bold().to_string()
    } else {
        " ".to_string()
    };
    format!(
        "{} {} [{:?}, {}]\n    {}",
        marker,
        device.name.bright_white(),
        device.flow,
        device.state,
        device.id.dimmed()
    )
}

fn describe_action(action: VolumeAction) -> String {
    match action {
        VolumeAction::Level(level) => format!("set to {}", level),
        VolumeAction::Mute(true) => "muted".to_string(),
        VolumeAction::Mute(false) => "unmuted".to_string(),
    }
}

/// One status line for a normalized process
pub fn outcome_line(outcome: &ProcessOutcome, action: VolumeAction) -> String {
    let process = format!("[{:>6}] {}", outcome.process.pid, outcome.process.name);
    match &outcome.outcome {
        Outcome::Applied(before) => format!(
            "{} {} {} (was {})",
            "✓".green(),
            process,
            describe_action(action).green(),
            before.volume
        ),
        Outcome::NoSession => format!("{} {} {}", "-".dimmed(), process, "no audio session".dimmed()),
    }
}

/// Line for a single-process command
pub fn single_line(pid: u32, before: Option<&SessionInfo>, action: VolumeAction) -> String {
    match before {
        Some(before) => format!(
            "{} (PID {}) {}",
            before.label().bright_white(),
            pid,
            describe_action(action).green()
        ),
        None => format!("PID {} has no audio session, nothing to do", pid)
            .dimmed()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{DataFlow, DeviceState, SessionState};
    use crate::process::WindowedProcess;
    use serial_test::serial;

    fn plain() {
        colored::control::set_override(false);
    }

    fn session() -> SessionInfo {
        SessionInfo {
            pid: 1234,
            display_name: String::new(),
            process_name: Some("Spotify.exe".to_string()),
            state: SessionState::Active,
            volume: VolumeLevel::new(0.25).unwrap(),
            muted: true,
            system_sounds: false,
        }
    }

    #[test]
    #[serial]
    fn test_device_header() {
        plain();
        let device = DeviceInfo {
            id: "{0.0.0.00000000}.{abc}".to_string(),
            name: "Speakers (Realtek)".to_string(),
            flow: DataFlow::Render,
            state: DeviceState::Active,
        };

        assert_eq!(
            device_header(&device, VolumeLevel::new(0.42).unwrap()),
            "Default Render Device: Speakers (Realtek)\nMaster Volume: 42%"
        );
        assert_eq!(
            device_line(&device, true),
            "* Speakers (Realtek) [Render, Active]\n    {0.0.0.00000000}.{abc}"
        );
    }

    #[test]
    #[serial]
    fn test_session_block() {
        plain();
        assert_eq!(
            session_block(&session()),
            "Spotify.exe (PID 1234)\n\t- State: Active\n\t- Volume: 25% (muted)"
        );
    }

    #[test]
    #[serial]
    fn test_outcome_lines() {
        plain();
        let process = WindowedProcess {
            pid: 1234,
            name: "Spotify.exe".to_string(),
        };
        let level = VolumeAction::Level(VolumeLevel::new(0.5).unwrap());

        let applied = ProcessOutcome {
            process: process.clone(),
            outcome: Outcome::Applied(session()),
        };
        assert_eq!(
            outcome_line(&applied, level),
            "✓ [  1234] Spotify.exe set to 50% (was 25%)"
        );

        let missing = ProcessOutcome {
            process,
            outcome: Outcome::NoSession,
        };
        assert_eq!(
            outcome_line(&missing, VolumeAction::Mute(true)),
            "- [  1234] Spotify.exe no audio session"
        );
    }

    #[test]
    #[serial]
    fn test_single_line_without_session() {
        plain();
        assert_eq!(
            single_line(55, None, VolumeAction::Mute(true)),
            "PID 55 has no audio session, nothing to do"
        );
    }
}
