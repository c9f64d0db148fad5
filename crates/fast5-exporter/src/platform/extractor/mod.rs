//! Extractor backed by an external parser process.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use error_stack::Report;
use error_stack::ResultExt;
use tokio::process::Command;

use crate::core::ExtractedStat;
use crate::core::ExtractionError;
use crate::core::Extractor;

mod wire;

pub use wire::parse_output;

/// Runs `<program> <args...> --path <file>` once per file and parses the
/// JSON array it prints on stdout.
///
/// Every invocation gets its own process group. When the extraction future
/// is dropped before the parser exits, the whole group is killed, so a
/// parser started through a wrapper script does not outlive a timeout.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl Extractor for CommandExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<ExtractedStat>, Report<ExtractionError>> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg("--path")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Report::new(ExtractionError::Spawn {
                    message: e.to_string(),
                })
            })
            .attach_printable_lazy(|| format!("program: {}", self.program))?;

        let group = ProcessGroup::new(child.id());
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| {
                Report::new(ExtractionError::Spawn {
                    message: format!("failed to wait for extractor: {e}"),
                })
            })
            .attach_printable_lazy(|| format!("program: {}", self.program))?;
        group.disarm();

        if !output.status.success() {
            return Err(Report::new(ExtractionError::NonZeroExit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
            .attach_printable(format!("path: {}", path.display())));
        }

        parse_output(&output.stdout).attach_printable_lazy(|| format!("path: {}", path.display()))
    }
}

/// Kills an invocation's process group on drop unless disarmed.
struct ProcessGroup {
    id: Option<libc::pid_t>,
}

impl ProcessGroup {
    fn new(leader: Option<u32>) -> Self {
        Self {
            id: leader.and_then(|pid| libc::pid_t::try_from(pid).ok()),
        }
    }

    fn disarm(mut self) {
        self.id = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            tracing::debug!(group = id, "killing abandoned extractor process group");
            unsafe { libc::killpg(id, libc::SIGKILL) };
        }
    }
}
