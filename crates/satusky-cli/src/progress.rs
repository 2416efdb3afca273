//! Terminal step announcements for `deploy create`.
//!
//! On a TTY each running step gets an animated spinner which is replaced by
//! `✓` or `✗` when the step ends. Anywhere else one plain line is written
//! per transition.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::tty::IsTty;
use crossterm::queue;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use satusky_deploy::{CreatedResource, DeployError, ProgressReporter, Step};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Reports pipeline progress on a terminal.
pub struct TerminalProgress {
    out: SharedWriter,
    interactive: bool,
    spinner: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for TerminalProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalProgress")
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}

impl TerminalProgress {
    /// Reports on stderr, animating when stderr is a terminal.
    #[must_use]
    pub fn stderr() -> Self {
        let interactive = io::stderr().is_tty();
        Self::with_writer(Box::new(io::stderr()), interactive)
    }

    /// Reports on an arbitrary writer.
    #[must_use]
    pub fn with_writer(out: Box<dyn Write + Send>, interactive: bool) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
            interactive,
            spinner: Mutex::new(None),
        }
    }

    fn stop_spinner(&self) {
        if let Some(handle) = self.spinner.lock().take() {
            handle.abort();
        }
    }

    fn finish_line(&self, mark: String, step: Step) {
        self.stop_spinner();
        let mut out = self.out.lock();
        let result = if self.interactive {
            queue!(
                out,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(format!("{mark} {step}\n"))
            )
        } else {
            writeln!(out, "{mark} {step}")
        };
        if result.and_then(|()| out.flush()).is_err() {
            tracing::debug!(%step, "progress output unavailable");
        }
    }
}

fn spin(out: SharedWriter, step: Step) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FRAME_INTERVAL);
        for frame in FRAMES.iter().cycle() {
            ticker.tick().await;
            let mut out = out.lock();
            let drawn = queue!(
                out,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(format!("{} {step}", (*frame).cyan()))
            )
            .and_then(|()| out.flush());
            if drawn.is_err() {
                return;
            }
        }
    })
}

impl ProgressReporter for TerminalProgress {
    fn step_started(&self, step: Step) {
        if self.interactive {
            if tokio::runtime::Handle::try_current().is_ok() {
                let handle = spin(Arc::clone(&self.out), step);
                if let Some(previous) = self.spinner.lock().replace(handle) {
                    previous.abort();
                }
            }
        } else {
            let mut out = self.out.lock();
            if writeln!(out, "… {step}").and_then(|()| out.flush()).is_err() {
                tracing::debug!(%step, "progress output unavailable");
            }
        }
    }

    fn step_completed(&self, step: Step) {
        let mark = if self.interactive { "✓".green().to_string() } else { "✓".to_string() };
        self.finish_line(mark, step);
    }

    fn step_failed(&self, step: Step, _error: &DeployError) {
        let mark = if self.interactive { "✗".red().to_string() } else { "✗".to_string() };
        self.finish_line(mark, step);
    }

    fn resources_retained(&self, resources: &[CreatedResource]) {
        let mut out = self.out.lock();
        let mut write = || -> io::Result<()> {
            writeln!(out, "The following resources were created before the failure and remain on the platform:")?;
            for resource in resources {
                writeln!(out, "  - {resource}")?;
            }
            out.flush()
        };
        if write().is_err() {
            tracing::debug!(count = resources.len(), "progress output unavailable");
        }
    }
}

impl Drop for TerminalProgress {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}
