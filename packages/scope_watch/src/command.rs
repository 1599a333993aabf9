//! Host-facing capture trigger.

use std::time::Duration;

use crate::{Engine, Error, Result};

/// A request to capture for a number of milliseconds, as typed by an operator.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use scope_watch::{CaptureCommand, Engine};
///
/// let command = CaptureCommand::parse("250").unwrap();
/// assert_eq!(command.window(), Duration::from_millis(250));
///
/// let engine = Engine::new();
/// command.execute(&engine).unwrap();
/// assert!(engine.is_active());
///
/// assert!(CaptureCommand::parse("soon").is_err());
/// assert!(CaptureCommand::parse("0").is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CaptureCommand {
    window: Duration,
}

impl CaptureCommand {
    /// Parses the capture length in milliseconds. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDuration`] if the argument is not an integer or is not positive.
    pub fn parse(argument: &str) -> Result<Self> {
        let trimmed = argument.trim();

        let millis = trimmed
            .parse::<i64>()
            .map_err(|e| Error::InvalidDuration {
                value: trimmed.to_string(),
                problem: e.to_string(),
            })?;

        let millis = u64::try_from(millis)
            .ok()
            .filter(|millis| *millis > 0)
            .ok_or_else(|| Error::InvalidDuration {
                value: trimmed.to_string(),
                problem: "capture length must be a positive number of milliseconds".to_string(),
            })?;

        Ok(Self {
            window: Duration::from_millis(millis),
        })
    }

    /// The requested capture window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Starts the capture on `engine`.
    ///
    /// # Errors
    ///
    /// See [`Engine::start_capture()`].
    pub fn execute(&self, engine: &Engine) -> Result<()> {
        engine.start_capture(self.window)
    }
}
