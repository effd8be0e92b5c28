//! Per-process session lookup and volume setting
//!
//! Every call enumerates afresh; nothing is cached between calls. A process
//! without an audio session is the normal case (it may simply not be playing
//! anything), so the setters return `Ok(())` and do nothing.

use super::{AudioBackend, AudioError, SessionControl, SessionInfo, VolumeLevel};
use tracing::{debug, trace};

/// What to do to a matched session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeAction {
    Level(VolumeLevel),
    Mute(bool),
}

impl VolumeAction {
    /// Apply this action to one session handle
    pub fn apply<S: SessionControl>(self, session: &S) -> Result<(), AudioError> {
        match self {
            VolumeAction::Level(level) => session.set_volume(level),
            VolumeAction::Mute(mute) => session.set_mute(mute),
        }
    }
}

/// Find the session owned by `pid`. First match wins.
pub fn session_for_process<B: AudioBackend>(
    backend: &B,
    pid: u32,
) -> Result<Option<B::Session>, AudioError> {
    for session in backend.sessions()? {
        if session.process_id()? == pid {
            trace!("Found audio session for PID {}", pid);
            return Ok(Some(session));
        }
    }
    Ok(None)
}

/// Set the volume of the session owned by `pid`, if there is one
pub fn set_application_volume<B: AudioBackend>(
    backend: &B,
    pid: u32,
    level: VolumeLevel,
) -> Result<(), AudioError> {
    apply_to_process(backend, pid, VolumeAction::Level(level)).map(|_| ())
}

/// Set the mute flag of the session owned by `pid`, if there is one
pub fn set_application_mute<B: AudioBackend>(
    backend: &B,
    pid: u32,
    mute: bool,
) -> Result<(), AudioError> {
    apply_to_process(backend, pid, VolumeAction::Mute(mute)).map(|_| ())
}

/// Apply `action` to the session owned by `pid`.
///
/// Returns the session as it was before the change, or `None` when the
/// process has no session.
pub fn apply_to_process<B: AudioBackend>(
    backend: &B,
    pid: u32,
    action: VolumeAction,
) -> Result<Option<SessionInfo>, AudioError> {
    let Some(session) = session_for_process(backend, pid)? else {
        debug!("No audio session for PID {}, skipping", pid);
        return Ok(None);
    };

    let before = session.snapshot()?;
    action.apply(&session)?;
    debug!("PID {} ({}): {:?}", pid, before.label(), action);
    Ok(Some(before))
}

/// Snapshot every session on the default render device
pub fn snapshot_sessions<B: AudioBackend>(backend: &B) -> Result<Vec<SessionInfo>, AudioError> {
    backend.sessions()?.iter().map(|s| s.snapshot()).collect()
}

/// Display labels of all current sessions
pub fn enumerate_applications<B: AudioBackend>(backend: &B) -> Result<Vec<String>, AudioError> {
    Ok(snapshot_sessions(backend)?
        .iter()
        .map(SessionInfo::label)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryBackend;

    fn level(value: f32) -> VolumeLevel {
        VolumeLevel::new(value).unwrap()
    }

    fn two_sessions() -> MemoryBackend {
        MemoryBackend::new("Speakers", level(0.4))
            .with_session(100, "a.exe", 0.9)
            .with_session(200, "b.exe", 0.7)
    }

    #[test]
    fn test_missing_session_is_noop() {
        let backend = two_sessions();
        let before = snapshot_sessions(&backend).unwrap();

        set_application_volume(&backend, 300, level(0.1)).unwrap();
        set_application_mute(&backend, 300, true).unwrap();

        assert_eq!(snapshot_sessions(&backend).unwrap(), before);
    }

    #[test]
    fn test_set_volume_touches_only_matching_session() {
        let backend = two_sessions();

        set_application_volume(&backend, 100, level(0.5)).unwrap();

        assert_eq!(backend.session_info(100).unwrap().volume.as_f32(), 0.5);
        assert_eq!(backend.session_info(200).unwrap().volume.as_f32(), 0.7);
    }

    #[test]
    fn test_set_mute_touches_only_matching_session() {
        let backend = two_sessions();

        set_application_mute(&backend, 200, true).unwrap();

        assert!(backend.session_info(200).unwrap().muted);
        assert!(!backend.session_info(100).unwrap().muted);
        assert_eq!(backend.session_info(200).unwrap().volume.as_f32(), 0.7);
    }

    #[test]
    fn test_first_match_wins() {
        let backend = MemoryBackend::new("Speakers", level(0.4))
            .with_session(100, "first.exe", 0.9)
            .with_session(100, "second.exe", 0.9);

        let before = apply_to_process(&backend, 100, VolumeAction::Level(level(0.2)))
            .unwrap()
            .unwrap();
        assert_eq!(before.label(), "first.exe");

        let volumes: Vec<f32> = snapshot_sessions(&backend)
            .unwrap()
            .iter()
            .map(|s| s.volume.as_f32())
            .collect();
        assert_eq!(volumes, vec![0.2, 0.9]);
    }

    #[test]
    fn test_apply_returns_state_before_change() {
        let backend = two_sessions();

        let before = apply_to_process(&backend, 100, VolumeAction::Level(level(0.3)))
            .unwrap()
            .unwrap();

        assert_eq!(before.volume.as_f32(), 0.9);
        assert_eq!(backend.session_info(100).unwrap().volume.as_f32(), 0.3);
    }

    #[test]
    fn test_enumeration_is_repeatable() {
        let backend = two_sessions();
        assert_eq!(
            snapshot_sessions(&backend).unwrap(),
            snapshot_sessions(&backend).unwrap()
        );
    }

    #[test]
    fn test_full_volume_round_trip() {
        let backend = two_sessions();

        set_application_volume(&backend, 200, VolumeLevel::FULL).unwrap();

        let session = session_for_process(&backend, 200).unwrap().unwrap();
        assert!((session.volume().unwrap().as_f32() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_enumerate_applications_uses_labels() {
        let backend = two_sessions();
        assert_eq!(
            enumerate_applications(&backend).unwrap(),
            vec!["a.exe".to_string(), "b.exe".to_string()]
        );
    }
}
