//! Command execution
//!
//! Each command talks to an [`AudioBackend`] and writes its report to any
//! `Write`, so the same code drives the console and the tests.

use crate::audio::{
    apply_to_process, snapshot_sessions, AudioBackend, VolumeAction, VolumeLevel,
};
use crate::cli::Command;
use crate::config::{AppConfig, DefaultAction};
use crate::process::ProcessSource;
use crate::raise::{normalize_processes, reset_all_sessions};
use crate::report;
use anyhow::{Context, Result};
use colored::*;
use std::io::Write;
use tracing::info;


/// Command run when none is given on the command line
pub fn default_command(config: &AppConfig) -> Command {
    Command::Normalize {
        mute: config.default_action == DefaultAction::Mute,
    }
}

/// Run one command against `backend`
pub fn run<B, P, W>(
    command: &Command,
    config: &AppConfig,
    backend: &B,
    processes: &P,
    out: &mut W,
) -> Result<()>
where
    B: AudioBackend,
    P: ProcessSource + ?Sized,
    W: Write,
{
    match command {
        Command::Normalize { mute } => run_normalize(*mute, backend, processes, out),
        Command::Reset { level } => {
            let level = match level {
                Some(level) => VolumeLevel::new(*level)?,
                None => config.reset_level()?,
            };
            run_reset(level, backend, out)
        }
        Command::List { json } => run_list(*json, backend, out),
        Command::Devices { json } => run_devices(*json, backend, out),
        Command::Set { pid, level } => {
            let level = VolumeLevel::new(*level)?;
            run_single(*pid, VolumeAction::Level(level), backend, out)
        }
        Command::Mute { pid } => run_single(*pid, VolumeAction::Mute(true), backend, out),
        Command::Unmute { pid } => run_single(*pid, VolumeAction::Mute(false), backend, out),
    }
}

fn run_normalize<B, P, W>(mute: bool, backend: &B, processes: &P, out: &mut W) -> Result<()>
where
    B: AudioBackend,
    P: ProcessSource + ?Sized,
    W: Write,
{
    let device = backend
        .default_device()
        .context("Failed to read the default render device")?;
    let master = backend
        .master_volume()
        .context("Failed to read the master volume")?;
    writeln!(out, "{}", report::device_header(&device, master))?;

    let action = if mute {
        VolumeAction::Mute(true)
    } else {
        VolumeAction::Level(master)
    };

    let processes = processes
        .windowed_processes()
        .context("Failed to list windowed processes")?;
    info!("Found {} windowed processes", processes.len());
    writeln!(out, "\nGetting windowed applications...")?;

    let outcomes = normalize_processes(backend, &processes, action)?;
    for outcome in &outcomes {
        writeln!(out, "{}", report::outcome_line(outcome, action))?;
    }

    let applied = outcomes.iter().filter(|o| o.applied()).count();
    let summary = if mute {
        format!("Volumes muted! ({} of {} applications)", applied, outcomes.len())
    } else {
        format!(
            "Volumes normalized! ({} of {} applications)",
            applied,
            outcomes.len()
        )
    };
    writeln!(out, "\n{}", summary.green().bold())?;
    Ok(())
}

fn run_reset<B: AudioBackend, W: Write>(level: VolumeLevel, backend: &B, out: &mut W) -> Result<()> {
    let device = backend
        .default_device()
        .context("Failed to read the default render device")?;
    let master = backend
        .master_volume()
        .context("Failed to read the master volume")?;
    writeln!(out, "{}", report::device_header(&device, master))?;
    writeln!(out, "\nGetting audio sessions...")?;

    let previous = reset_all_sessions(backend, level)?;
    for session in &previous {
        writeln!(out, "{}", report::session_block(session))?;
    }

    writeln!(out, "\n{}", format!("Volumes reset to {}!", level).green().bold())?;
    Ok(())
}

fn run_list<B: AudioBackend, W: Write>(json: bool, backend: &B, out: &mut W) -> Result<()> {
    let sessions = snapshot_sessions(backend)?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&sessions)?)?;
        return Ok(());
    }

    if sessions.is_empty() {
        writeln!(out, "{}", "No audio sessions".dimmed())?;
    }
    for session in &sessions {
        writeln!(out, "{}", report::session_block(session))?;
    }
    Ok(())
}

fn run_devices<B: AudioBackend, W: Write>(json: bool, backend: &B, out: &mut W) -> Result<()> {
    let devices = backend.devices()?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&devices)?)?;
        return Ok(());
    }

    let default_id = backend.default_device()?.id;
    for device in &devices {
        writeln!(out, "{}", report::device_line(device, device.id == default_id))?;
    }
    Ok(())
}

fn run_single<B: AudioBackend, W: Write>(
    pid: u32,
    action: VolumeAction,
    backend: &B,
    out: &mut W,
) -> Result<()> {
    let before = apply_to_process(backend, pid, action)?;
    writeln!(out, "{}", report::single_line(pid, before.as_ref(), action))?;
    Ok(())
}
