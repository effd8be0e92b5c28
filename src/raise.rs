//! Normalization passes over many sessions
//!
//! `normalize_processes` walks windowed processes and applies one action to
//! each one's session; `reset_all_sessions` sets every session on the device
//! to a fixed level regardless of who owns it.

use crate::audio::{
    apply_to_process, AudioBackend, AudioError, SessionControl, SessionInfo, VolumeAction,
    VolumeLevel,
};
use crate::process::WindowedProcess;
use tracing::{debug, info};

/// Result of applying an action to one process
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The process had a session; holds its state before the change
    Applied(SessionInfo),
    /// The process has no audio session right now
    NoSession,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub process: WindowedProcess,
    pub outcome: Outcome,
}

impl ProcessOutcome {
    pub fn applied(&self) -> bool {
        matches!(self.outcome, Outcome::Applied(_))
    }
}

/// Apply `action` to the session of every process in `processes`
pub fn normalize_processes<B: AudioBackend>(
    backend: &B,
    processes: &[WindowedProcess],
    action: VolumeAction,
) -> Result<Vec<ProcessOutcome>, AudioError> {
    let mut outcomes = Vec::with_capacity(processes.len());

    for process in processes {
        let outcome = match apply_to_process(backend, process.pid, action)? {
            Some(before) => Outcome::Applied(before),
            None => Outcome::NoSession,
        };
        outcomes.push(ProcessOutcome {
            process: process.clone(),
            outcome,
        });
    }

    let applied = outcomes.iter().filter(|o| o.applied()).count();
    info!(
        "Applied {:?} to {} of {} windowed processes",
        action,
        applied,
        outcomes.len()
    );
    Ok(outcomes)
}

/// Set every session on the default device to `level`.
///
/// Returns each session as it was before the change.
pub fn reset_all_sessions<B: AudioBackend>(
    backend: &B,
    level: VolumeLevel,
) -> Result<Vec<SessionInfo>, AudioError> {
    let mut previous = Vec::new();

    for session in backend.sessions()? {
        let before = session.snapshot()?;
        session.set_volume(level)?;
        debug!("Reset {} from {} to {}", before.label(), before.volume, level);
        previous.push(before);
    }

    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryBackend;

    fn process(pid: u32, name: &str) -> WindowedProcess {
        WindowedProcess {
            pid,
            name: name.to_string(),
        }
    }

    fn backend() -> MemoryBackend {
        MemoryBackend::new("Speakers", VolumeLevel::new(0.35).unwrap())
            .with_session(100, "game.exe", 1.0)
            .with_session(200, "chat.exe", 0.1)
            .with_session(300, "background.exe", 0.6)
    }

    #[test]
    fn test_normalize_sets_windowed_sessions_to_master() {
        let backend = backend();
        let master = backend.master_volume().unwrap();

        let outcomes = normalize_processes(
            &backend,
            &[process(100, "game.exe"), process(200, "chat.exe")],
            VolumeAction::Level(master),
        )
        .unwrap();

        assert!(outcomes.iter().all(ProcessOutcome::applied));
        assert_eq!(backend.session_info(100).unwrap().volume, master);
        assert_eq!(backend.session_info(200).unwrap().volume, master);
        // Not windowed, left alone
        assert_eq!(backend.session_info(300).unwrap().volume.as_f32(), 0.6);
    }

    #[test]
    fn test_normalize_reports_processes_without_sessions() {
        let backend = backend();

        let outcomes = normalize_processes(
            &backend,
            &[process(100, "game.exe"), process(999, "notepad.exe")],
            VolumeAction::Mute(true),
        )
        .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(&outcomes[0].outcome, Outcome::Applied(before) if !before.muted));
        assert_eq!(outcomes[1].outcome, Outcome::NoSession);
        assert!(backend.session_info(100).unwrap().muted);
    }

    #[test]
    fn test_reset_sets_every_session() {
        let backend = backend();

        let previous = reset_all_sessions(&backend, VolumeLevel::FULL).unwrap();

        let old: Vec<f32> = previous.iter().map(|s| s.volume.as_f32()).collect();
        assert_eq!(old, vec![1.0, 0.1, 0.6]);
        for pid in [100, 200, 300] {
            assert_eq!(backend.session_info(pid).unwrap().volume, VolumeLevel::FULL);
        }
    }

    #[test]
    fn test_reset_with_no_sessions() {
        let backend = MemoryBackend::new("Speakers", VolumeLevel::FULL);
        assert!(reset_all_sessions(&backend, VolumeLevel::FULL)
            .unwrap()
            .is_empty());
    }
}
