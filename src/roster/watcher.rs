//! Roster file watcher.
//!
//! A [`notify`] watcher on the roster's parent directory forwards a unit
//! event into a tokio channel each time the roster file is written. Editors
//! commonly replace files instead of writing in place, so the directory is
//! watched rather than the file itself.

use std::ffi::OsString;
use std::path::Path;

use anyhow::Context;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Keeps the underlying file watcher alive.
///
/// Dropping it stops change notifications.
pub struct RosterWatcher {
    _watcher: RecommendedWatcher,
}

impl std::fmt::Debug for RosterWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterWatcher").finish_non_exhaustive()
    }
}

impl RosterWatcher {
    /// Start watching `roster_path`.
    ///
    /// Returns the watcher handle and a receiver that yields one `()` per
    /// observed create or modify event on the file. Bursts are not
    /// coalesced; reconciling twice against the same snapshot is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if the path has no file name or the watcher cannot
    /// be registered.
    pub fn spawn(roster_path: &Path) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<()>)> {
        let file_name: OsString = roster_path
            .file_name()
            .context("roster path has no file name")?
            .to_os_string();
        let dir = match roster_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };

        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher =
            notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
                let evt = match event {
                    Ok(evt) => evt,
                    Err(e) => {
                        warn!(error = %e, "roster watcher error");
                        return;
                    }
                };
                if !matches!(evt.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    return;
                }
                let touches_roster = evt
                    .paths
                    .iter()
                    .any(|path| path.file_name() == Some(file_name.as_os_str()));
                if touches_roster {
                    debug!(kind = ?evt.kind, "roster file changed");
                    if tx.send(()).is_err() {
                        debug!("roster change receiver dropped");
                    }
                }
            })
            .context("failed to create roster watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;

        info!(path = %roster_path.display(), "watching roster for changes");
        Ok((Self { _watcher: watcher }, rx))
    }
}
