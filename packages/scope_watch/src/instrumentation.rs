use std::sync::Arc;

use crate::{Engine, TimerHandle};

/// Access to the instrumentation engine from code that may run without one.
///
/// Instrumented components receive this once (e.g. at construction) and keep it. When the
/// engine is not available, every timer is inert and the instrumented code pays only for
/// checking which variant it holds.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use scope_watch::{Engine, Instrumentation};
///
/// fn hot_loop(instrumentation: &Instrumentation) -> u64 {
///     instrumentation.measure(&["hot_loop"], || (0..1000_u64).sum())
/// }
///
/// assert_eq!(hot_loop(&Instrumentation::Unavailable), 499_500);
/// assert_eq!(hot_loop(&Instrumentation::from(Arc::new(Engine::new()))), 499_500);
/// ```
#[expect(
    clippy::exhaustive_enums,
    reason = "intentionally narrow, the engine is either there or not"
)]
#[derive(Clone, Debug, Default)]
pub enum Instrumentation {
    /// Timers are forwarded to the engine.
    Available(Arc<Engine>),

    /// No engine is present. Timers are inert.
    #[default]
    Unavailable,
}

impl Instrumentation {
    /// The engine, if available.
    #[must_use]
    pub fn engine(&self) -> Option<&Arc<Engine>> {
        match self {
            Self::Available(engine) => Some(engine),
            Self::Unavailable => None,
        }
    }

    /// Creates a timer for the tag formed by `segments`. See [`Engine::timer()`].
    pub fn timer<S>(&self, segments: &[S]) -> TimerHandle<'_>
    where
        S: AsRef<str>,
    {
        match self {
            Self::Available(engine) => engine.timer(segments),
            Self::Unavailable => TimerHandle::inert(),
        }
    }

    /// Measures the execution of `f`. See [`Engine::measure()`].
    pub fn measure<S, R, F>(&self, segments: &[S], f: F) -> R
    where
        S: AsRef<str>,
        F: FnOnce() -> R,
    {
        match self {
            Self::Available(engine) => engine.measure(segments, f),
            Self::Unavailable => f(),
        }
    }
}

impl From<Arc<Engine>> for Instrumentation {
    fn from(engine: Arc<Engine>) -> Self {
        Self::Available(engine)
    }
}

impl From<Option<Arc<Engine>>> for Instrumentation {
    fn from(engine: Option<Arc<Engine>>) -> Self {
        engine.map_or(Self::Unavailable, Self::Available)
    }
}
