//! Opens the configuration file in the user's editor.

use crate::config::get_config_path;
use anyhow::{anyhow, Context};
use std::path::Path;
use std::process::Command;

/// Editors tried when neither `$VISUAL` nor `$EDITOR` is set.
const FALLBACK_EDITORS: [&str; 2] = ["nano", "vi"];

/// Creates the config file if needed and opens it for editing.
///
/// # Errors
/// - If the config file cannot be created
/// - If no editor can be found, or it exits with a failure
pub fn handle_config() -> anyhow::Result<()> {
    let config_path = get_config_path()?;
    crate::setup::run_setup(&config_path)?;

    let editor = pick_editor()?;
    tracing::info!("Opening {} with {}", config_path.display(), editor);
    open_in_editor(&editor, &config_path)?;

    println!("Edited {}", config_path.display());
    Ok(())
}

fn open_in_editor(editor: &str, path: &Path) -> anyhow::Result<()> {
    // $EDITOR may carry arguments, e.g. "code --wait".
    let mut parts = editor.split_whitespace();
    let program = parts.next().context("Editor command is empty")?;

    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to launch editor '{editor}'"))?;

    if !status.success() {
        return Err(anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }
    Ok(())
}

fn pick_editor() -> anyhow::Result<String> {
    let from_env = ["VISUAL", "EDITOR"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty());
    if let Some(editor) = from_env {
        return Ok(editor);
    }

    FALLBACK_EDITORS
        .into_iter()
        .find(|editor| on_path(editor))
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

fn on_path(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .is_ok_and(|output| output.status.success())
}
