//! The extraction loop: drives a language model through read and propose
//! tool calls for each attention point in a transcript.
//!
//! 1. **Seed** a fresh conversation with the system rules, the numbered
//!    transcript and the attention message
//! 2. **Send** it to the model along with the tool manifest
//! 3. **If tool calls**: run them in order, append the results, go to 2
//! 4. **Otherwise**, or once the turn cap is hit: stop
//!
//! The output is the list of Actions the propose tools staged.

pub mod loop_runner;
pub mod prompt;
pub mod scripted;

pub use loop_runner::{
    DEFAULT_MAX_TURNS, ExtractionError, ExtractionLoop, ExtractionOutcome, IndexFailure, IndexRun, StopReason,
};
pub use scripted::ScriptedProvider;
