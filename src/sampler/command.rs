//! External command invocation with a hard deadline.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Result, SysmoniError};

/// Run `program args..` and return its stdout.
///
/// Exceeding `timeout` is reported as [`SysmoniError::Timeout`] and the child is
/// killed when its handle is dropped. A missing binary or a non-zero exit is a
/// [`SysmoniError::Command`].
pub async fn run_with_timeout(program: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(result) => result
            .map_err(|e| SysmoniError::command(format!("failed to spawn {}: {}", program, e)))?,
        Err(_) => return Err(SysmoniError::timeout(program, timeout)),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SysmoniError::command(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
