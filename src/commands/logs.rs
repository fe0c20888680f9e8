//! Prints the tail of the newest log file.

use crate::logging::{log_dir, log_files};
use anyhow::Context;
use std::fs;
use std::path::Path;

const DEFAULT_LINES: usize = 50;

/// Shows the last lines of the most recent log file.
///
/// # Errors
/// - If the log directory cannot be determined
/// - If the log file cannot be read
pub fn handle_logs() -> anyhow::Result<()> {
    let log_dir = log_dir()?;
    if !log_dir.exists() {
        println!("No logs yet. They are written to {}", log_dir.display());
        return Ok(());
    }

    let Some(latest) = log_files(&log_dir)?.into_iter().next() else {
        println!("No log files found in {}", log_dir.display());
        return Ok(());
    };

    let (shown, total) = print_tail(&latest, DEFAULT_LINES)?;
    println!();
    println!(
        "Showed {shown} of {total} lines from {}",
        latest.display()
    );
    Ok(())
}

/// Prints the last `count` lines of `path`; returns (printed, total).
fn print_tail(path: &Path, count: usize) -> anyhow::Result<(usize, usize)> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file {}", path.display()))?;
    let lines = tail(&content, count);
    for line in &lines {
        println!("{line}");
    }
    Ok((lines.len(), content.lines().count()))
}

fn tail(content: &str, count: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    lines[lines.len().saturating_sub(count)..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_returns_last_lines() {
        let content = (1..=60).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        let lines = tail(&content, DEFAULT_LINES);
        assert_eq!(lines.len(), 50);
        assert_eq!(lines[0], "11");
        assert_eq!(lines[49], "60");
        assert_eq!(tail("a\nb", 50), ["a", "b"]);
    }
}
