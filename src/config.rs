use crate::storage::SLOT_FILE;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug, Clone)]
#[command(name = "pixeljail")]
#[command(about = "KROOKZ: Pixel Jail, a terminal inmate that decays in real time", long_about = None)]
pub(crate) struct Args {
    /// Save slot path (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub(crate) save: Option<PathBuf>,

    /// FPS cap for the redraw loop
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// Draw with plain ASCII instead of braille pixels
    #[arg(long, default_value_t = false)]
    pub(crate) ascii: bool,

    /// Disable truecolor output
    #[arg(long, default_value_t = false)]
    pub(crate) no_color: bool,

    /// Seed for escape rolls (random if omitted)
    #[arg(long, global = true)]
    pub(crate) seed: Option<u64>,

    /// Write logs to this file
    #[arg(long, global = true)]
    pub(crate) log: Option<PathBuf>,

    /// More log detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Run the interactive jail (default)
    Play,
    /// Print the current record as JSON
    Status,
    /// Slip the inmate a contraband snack
    Feed,
    /// Bribe the guard
    Bribe,
    /// Attempt a breakout
    Escape,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    pub(crate) enable_braille: bool,
    /// Seconds between decay ticks.
    pub(crate) tick_secs: u64,
    /// How long an action message stays on screen.
    pub(crate) message_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            enable_color: true,
            enable_braille: true,
            tick_secs: 10,
            message_ms: 3500,
        }
    }
}

impl Settings {
    /// Flags win over the settings file for this run only.
    pub(crate) fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(fps) = args.fps {
            self.fps_cap = fps;
        }
        if args.ascii {
            self.enable_braille = false;
        }
        if args.no_color {
            self.enable_color = false;
        }
        self.fps_cap = self.fps_cap.clamp(5, 240);
        self.tick_secs = self.tick_secs.max(1);
        self
    }
}

pub(crate) struct Paths {
    pub(crate) save_path: PathBuf,
    pub(crate) settings_path: PathBuf,
}

pub(crate) fn project_paths(save_override: Option<&Path>) -> Result<Paths> {
    let proj = ProjectDirs::from("com", "krookz", "PixelJail")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Ok(Paths {
        save_path: save_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.join(SLOT_FILE)),
        settings_path: dir.join("settings.json"),
    })
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        match serde_json::from_str::<Settings>(&s) {
            Ok(v) => return v,
            Err(e) => tracing::warn!("ignoring bad settings file {}: {}", path.display(), e),
        }
    }
    Settings::default()
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)
        .with_context(|| format!("could not replace {}", path.display()))?;
    Ok(())
}

/// Writes defaults only when there is no file yet; an existing one is left alone.
pub(crate) fn ensure_settings_file(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    save_settings_atomic(path, &Settings::default())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> io::Result<()> {
    // rename(2) already replaces on unix; clear the target first for windows
    if to.is_file() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_and_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut s = Settings::default();
        s.fps_cap = 60;
        s.enable_braille = false;
        save_settings_atomic(&path, &s).unwrap();
        let back = load_settings(&path);
        assert_eq!(back.fps_cap, 60);
        assert!(!back.enable_braille);

        fs::write(&path, r#"{"tick_secs": 2}"#).unwrap();
        let partial = load_settings(&path);
        assert_eq!(partial.tick_secs, 2);
        assert_eq!(partial.message_ms, 3500);
    }

    #[test]
    fn settings_file_is_created_once_and_never_clobbered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        ensure_settings_file(&path).unwrap();
        assert_eq!(load_settings(&path).fps_cap, 30);

        fs::write(&path, r#"{"fps_cap": 12, "enable_color": false}"#).unwrap();
        ensure_settings_file(&path).unwrap();
        let kept = load_settings(&path);
        assert_eq!(kept.fps_cap, 12);
        assert!(!kept.enable_color);
    }

    #[test]
    fn bad_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "nope").unwrap();
        assert_eq!(load_settings(&path).fps_cap, 30);
    }

    #[test]
    fn flags_override_settings() {
        let args = Args::parse_from(["pixeljail", "--fps", "1000", "--ascii", "--no-color"]);
        let s = Settings::default().with_overrides(&args);
        assert_eq!(s.fps_cap, 240);
        assert!(!s.enable_braille);
        assert!(!s.enable_color);
        assert_eq!(args.command, None);
    }

    #[test]
    fn subcommands_parse() {
        let args = Args::parse_from(["pixeljail", "feed", "--save", "/tmp/x.json", "-vv"]);
        assert_eq!(args.command, Some(Command::Feed));
        assert_eq!(args.save.as_deref(), Some(Path::new("/tmp/x.json")));
        assert_eq!(args.verbose, 2);
    }
}
