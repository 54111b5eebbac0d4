//! Terminal rendering and file helpers

use anyhow::{Context, Result};
use omni_coder::{language_for_extension, Solution};
use omni_error::{Error, ErrorKind};
use std::path::Path;

pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

/// Human-readable rendering of a solution
pub fn format_solution(solution: &Solution, quiet: bool) -> String {
    let mut sections = Vec::new();

    match solution {
        Solution::Logic(logic) => {
            if !logic.explanation.is_empty() {
                sections.push(logic.explanation.clone());
            }
            if !logic.code.is_empty() {
                let header = if quiet {
                    String::new()
                } else {
                    format!("--- CODE ({}) ---\n", logic.language)
                };
                sections.push(format!("{}{}", header, logic.code));
            }
            if let Some(complexity) = &logic.complexity {
                sections.push(format!("Complexity: {}", complexity));
            }
        }
        Solution::Web(web) => {
            for (name, body) in [("HTML", &web.html), ("CSS", &web.css), ("JS", &web.js)] {
                if body.is_empty() {
                    continue;
                }
                if quiet {
                    sections.push(body.clone());
                } else {
                    sections.push(format!("--- {} ---\n{}", name, body));
                }
            }
        }
    }

    sections.join("\n\n")
}

/// Write the preview document of a web solution. Returns `false` for logic
/// solutions, which have nothing to preview.
pub fn write_preview(path: &Path, solution: &Solution) -> Result<bool> {
    match solution.preview_document() {
        Some(document) => {
            std::fs::write(path, document)
                .with_context(|| format!("failed to write preview to {}", path.display()))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// `explicit` if given, otherwise guessed from the file extension
pub fn resolve_language(file: &Path, explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| {
            file.extension()
                .and_then(|ext| ext.to_str())
                .and_then(language_for_extension)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "auto".to_string())
}

/// Separate a waiting prompt from what the user types
pub fn prompt_padding(fresh: &str) -> &'static str {
    match fresh.chars().last() {
        Some(c) if !c.is_whitespace() => " ",
        _ => "",
    }
}

/// Turn a library error into something worth showing at a terminal
pub fn explain(err: Error) -> anyhow::Error {
    match err.kind() {
        ErrorKind::CredentialsMissing => {
            let var = err.context_value("env_var").unwrap_or("the API key").to_string();
            anyhow::anyhow!("{} is missing. Set it in the environment or in .env.local", var)
        }
        ErrorKind::TurnLimitExceeded => {
            let max = err.context_value("max_turns").unwrap_or("?").to_string();
            anyhow::anyhow!(
                "the program was still asking for input after {} turns (raise --max-turns)",
                max
            )
        }
        _ => anyhow::Error::new(err),
    }
}
