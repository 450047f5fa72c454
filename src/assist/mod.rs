//! Typing assistance: typo correction and command prediction.

mod correction;
mod prediction;

pub use correction::{Correction, KNOWN_COMMANDS, correct_command, levenshtein};
pub use prediction::{CommandPattern, MAX_PREDICTIONS, Predictor, RECENT_LIMIT};
