mod controller;
mod exercise;
mod progress;
mod runner;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{AnswerOutcome, Phase, SessionContext, SessionController, Step};
pub use exercise::ExerciseService;
pub use progress::{PlayerProgress, SessionProgress};
pub use runner::{ExerciseEvent, ExerciseRunner, RunOutcome};
