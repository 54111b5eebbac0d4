//! Simulated program runs.
//!
//! Two protocols share one request type:
//! - **batch**: no stdin queue; the model prints the whole stdout, inventing
//!   input where the program asks for it
//! - **interactive**: a stdin queue (possibly empty) is sent; the model stops
//!   at the first read that the queue cannot satisfy and appends
//!   [`WAITING_SENTINEL`]

use serde::{Deserialize, Serialize};

/// Token the model appends when the simulated program blocks on input
pub const WAITING_SENTINEL: &str = "<WAITING_FOR_INPUT>";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    /// Every line of input entered so far. `None` selects the batch protocol.
    #[serde(default)]
    pub stdin: Option<Vec<String>>,
}

impl RunRequest {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            stdin: None,
        }
    }

    pub fn with_stdin(mut self, stdin: Vec<String>) -> Self {
        self.stdin = Some(stdin);
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.stdin.is_some()
    }

    /// The language tag sent to the model; blank means "work it out"
    pub fn language_tag(&self) -> &str {
        match self.language.trim() {
            "" => "auto",
            tag => tag,
        }
    }

    /// The queue rendered as the program would see it: one line per entry
    pub fn stdin_buffer(&self) -> Option<String> {
        self.stdin.as_ref().map(|lines| stdin_buffer(lines))
    }
}

/// Render queued input lines, each terminated by a newline
pub fn stdin_buffer(lines: &[String]) -> String {
    lines.iter().fold(String::new(), |mut buffer, line| {
        buffer.push_str(line);
        buffer.push('\n');
        buffer
    })
}

/// What a run produced so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub output: String,
    /// The simulated program is blocked on a read
    #[serde(default)]
    pub waiting: bool,
}

impl RunOutput {
    /// Batch replies are plain stdout
    pub fn from_batch_reply(raw: &str) -> Self {
        Self {
            output: raw.trim().to_string(),
            waiting: false,
        }
    }

    /// Decode an interactive reply.
    ///
    /// Accepts a JSON object `{"stdout", "status"}` as well as the sentinel
    /// text protocol, since models sometimes answer in JSON regardless.
    pub fn from_interactive_reply(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Some(decoded) = Self::from_status_json(trimmed) {
            return decoded;
        }

        if trimmed.contains(WAITING_SENTINEL) {
            Self {
                output: trimmed.replace(WAITING_SENTINEL, "").trim_end().to_string(),
                waiting: true,
            }
        } else {
            Self {
                output: trimmed.to_string(),
                waiting: false,
            }
        }
    }

    fn from_status_json(text: &str) -> Option<Self> {
        if !text.starts_with('{') {
            return None;
        }

        #[derive(Deserialize)]
        struct StatusReply {
            stdout: String,
            status: String,
        }

        let reply: StatusReply = serde_json::from_str(text).ok()?;
        let waiting = match reply.status.trim().to_ascii_uppercase().as_str() {
            "WAITING" => true,
            "COMPLETED" => false,
            _ => return None,
        };

        Some(Self {
            output: reply.stdout.replace(WAITING_SENTINEL, "").trim_end().to_string(),
            waiting,
        })
    }
}
