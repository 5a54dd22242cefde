//! External chapter processors configured per file extension.

use std::path::Path;
use std::process::Command;

use bind_core::error::{BindError, Result};
use bind_utils::encoding::decode_to_utf8;

/// Run `command_template` for the chapter `file` and return its standard
/// output as HTML.
///
/// Each `{}` in the template is replaced by the file name; a template
/// without `{}` gets the file name as its last argument. The command runs
/// in `source_dir`, so relative chapter names resolve.
pub fn run_processor(command_template: &str, file: &str, source_dir: &Path) -> Result<String> {
    let failure = |reason: String| BindError::ExternalProcessorFailure {
        file: file.to_string(),
        command: command_template.to_string(),
        reason,
    };

    let mut parts = command_template.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| failure("empty command".to_string()))?;
    let mut args: Vec<String> = parts.map(|part| part.replace("{}", file)).collect();
    if !command_template.contains("{}") {
        args.push(file.to_string());
    }

    log::debug!("Running {} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(&args)
        .current_dir(source_dir)
        .output()
        .map_err(|e| failure(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().next().unwrap_or("").trim();
        return Err(failure(if detail.is_empty() {
            output.status.to_string()
        } else {
            format!("{}: {}", output.status, detail)
        }));
    }

    let (html, encoding) = decode_to_utf8(&output.stdout);
    if encoding != "UTF-8" {
        log::debug!("Output of {} decoded as {}", program, encoding);
    }
    Ok(html)
}
