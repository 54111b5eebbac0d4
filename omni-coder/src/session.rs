//! Interactive runs as a sequence of turns.
//!
//! The model has no memory between calls, so every turn resends the code and
//! the whole stdin queue and gets back the whole transcript. The session
//! keeps the queue, tracks which part of the transcript has already been
//! shown, and stops after a fixed number of turns.

use crate::coder::Coder;
use crate::run::{RunOutput, RunRequest};
use omni_error::{Error, Result};
use omni_llm::LlmProvider;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started yet
    Ready,
    /// Blocked on a read; feed it with [`StdinSession::provide`]
    Waiting,
    /// The program ran to completion
    Completed,
}

#[derive(Debug, Clone)]
pub struct StdinSession {
    code: String,
    language: String,
    stdin: Vec<String>,
    state: SessionState,
    output: String,
    shown: String,
    echo: Option<String>,
    turns: usize,
    max_turns: usize,
}

impl StdinSession {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            stdin: Vec::new(),
            state: SessionState::Ready,
            output: String::new(),
            shown: String::new(),
            echo: None,
            turns: 0,
            max_turns: 16,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stdin(&self) -> &[String] {
        &self.stdin
    }

    /// Full transcript as of the last turn
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Run the program with an empty queue. Restarts a finished session.
    pub async fn start<P: LlmProvider>(&mut self, coder: &Coder<P>) -> Result<RunOutput> {
        self.stdin.clear();
        self.output.clear();
        self.shown.clear();
        self.echo = None;
        self.turns = 0;
        self.state = SessionState::Ready;
        self.turn(coder).await
    }

    /// Answer the pending read with `line` and run the next turn.
    ///
    /// On failure the line is taken back off the queue so the call can be
    /// repeated.
    pub async fn provide<P: LlmProvider>(
        &mut self,
        coder: &Coder<P>,
        line: impl Into<String>,
    ) -> Result<RunOutput> {
        if self.state != SessionState::Waiting {
            return Err(Error::invalid_state(format!(
                "session is {:?}, not waiting for input",
                self.state
            ))
            .with_operation("session::provide"));
        }

        let line = line.into();
        self.stdin.push(line.clone());
        self.echo = Some(line);

        let result = self.turn(coder).await;
        if result.is_err() {
            self.stdin.pop();
            self.echo = None;
        }
        result
    }

    async fn turn<P: LlmProvider>(&mut self, coder: &Coder<P>) -> Result<RunOutput> {
        if self.turns >= self.max_turns {
            return Err(Error::turn_limit_exceeded(self.max_turns).with_operation("session::turn"));
        }

        let request = RunRequest::new(self.code.clone(), self.language.clone())
            .with_stdin(self.stdin.clone());
        let output = coder.run(&request).await?;

        self.turns += 1;
        self.output = output.output.clone();
        self.state = if output.waiting {
            SessionState::Waiting
        } else {
            SessionState::Completed
        };

        debug!(turn = self.turns, queued = self.stdin.len(), state = ?self.state, "session turn");
        Ok(output)
    }

    /// The part of the transcript not shown yet.
    ///
    /// The model echoes consumed input; a terminal has already echoed what
    /// the user typed, so the echo of the last line is dropped. When the
    /// model rewrote earlier output the whole transcript is returned.
    pub fn new_output(&mut self) -> String {
        let fresh = match self.output.strip_prefix(self.shown.as_str()) {
            Some(rest) => {
                let rest = match &self.echo {
                    Some(echo) => {
                        let trimmed = rest.trim_start_matches(' ');
                        match trimmed.strip_prefix(echo.as_str()) {
                            Some(after) => after.strip_prefix('\n').unwrap_or(after),
                            None => rest,
                        }
                    }
                    None => rest,
                };
                rest.to_string()
            }
            None => self.output.clone(),
        };

        self.shown = self.output.clone();
        self.echo = None;
        fresh
    }
}
