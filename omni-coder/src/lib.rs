//! # omni-coder
//!
//! The two operations of Omni Coder, built on `omni-llm`:
//!
//! - **solve**: turn a natural-language request into either a web solution
//!   (HTML, CSS, JS) or a logic solution (explanation, code, complexity)
//! - **run**: have the model act as the interpreter and report the stdout a
//!   program would produce, optionally pausing at reads that the supplied
//!   stdin queue cannot satisfy
//!
//! Nothing is compiled or executed locally. Every answer is model output.
//!
//! ```rust,no_run
//! use omni_coder::{Coder, SolveRequest};
//! use omni_llm::{OpenAIProvider, ProviderConfig};
//!
//! # async fn demo() -> omni_error::Result<()> {
//! let provider = OpenAIProvider::new(ProviderConfig::groq(std::env::var("GROQ_API_KEY").ok()))
//!     .map_err(|e| e.into_error())?;
//! let coder = Coder::new(provider);
//! let solution = coder.solve(&SolveRequest::new("a counter button")).await?;
//! println!("{}", solution.kind());
//! # Ok(())
//! # }
//! ```

pub mod coder;
pub mod languages;
pub mod prompts;
pub mod run;
pub mod session;
pub mod solution;
pub mod solve;

#[cfg(test)]
pub(crate) mod testing;

pub use coder::{Coder, CoderConfig, InferenceSettings};
pub use languages::{
    find_language, language_for_extension, LanguageInfo, RUN_LANGUAGES, SOLVE_LANGUAGES,
};
pub use run::{stdin_buffer, RunOutput, RunRequest, WAITING_SENTINEL};
pub use session::{SessionState, StdinSession};
pub use solution::{parse_solution, LogicSolution, Solution, WebSolution};
pub use solve::SolveRequest;
