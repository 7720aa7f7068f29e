use anyhow::{anyhow, Context, Result};
use std::{fs::OpenOptions, path::Path, sync::Mutex};
use tracing::Level;

fn level_for(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Logs go to a file or nowhere; stdout belongs to the terminal UI.
pub(crate) fn init(path: Option<&Path>, verbose: u8) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(level_for(verbose))
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!("could not install logger: {e}"))?;

    tracing::info!("logging to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for(0), Level::WARN);
        assert_eq!(level_for(1), Level::INFO);
        assert_eq!(level_for(2), Level::DEBUG);
        assert_eq!(level_for(9), Level::TRACE);
    }

    #[test]
    fn no_path_is_a_no_op() {
        assert!(init(None, 3).is_ok());
    }
}
