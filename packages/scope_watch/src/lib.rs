#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! # scope_watch
//!
//! Scoped timers for hot code, aggregated only while a time-bounded capture is running.
//!
//! Instrumentation points are free to stay in the code permanently: while no capture is
//! active, creating and dropping a timer does not allocate and records nothing.
//! When an operator starts a capture, every timer closed within the capture window
//! contributes one sample to the statistics of its tag. When the window ends, a report
//! is rendered and handed to a sink.
//!
//! # Capturing
//!
//! ```
//! use std::time::Duration;
//!
//! use scope_watch::Engine;
//!
//! let engine = Engine::new();
//!
//! engine.start_capture(Duration::from_millis(100)).unwrap();
//!
//! for _ in 0..10 {
//!     let _timer = engine.timer(&["world", "physics", "step"]);
//!     // Work to measure.
//! }
//! ```
//!
//! Tags are formed by joining the segments with `::`. Identical segment lists share one
//! entry, no matter where the timers are created. Nested timers are independent samples;
//! the time of an inner timer is not subtracted from the outer one.
//!
//! A timer measures until it is dropped or explicitly [closed][TimerHandle::close].
//! To measure a bounded block, use [`Engine::measure()`]:
//!
//! ```
//! # use scope_watch::Engine;
//! # let engine = Engine::new();
//! let checksum = engine.measure(&["checksum"], || (0..100_u32).sum::<u32>());
//! # assert_eq!(checksum, 4950);
//! ```
//!
//! # Reports
//!
//! The end of the capture window is detected by the first timer created or closed after it,
//! or by the host calling [`Engine::tick()`]. Samples closed at or after the end of the
//! window are dropped.
//!
//! The report lists every tag with its minimum, maximum, average and cumulative duration
//! plus the number of calls, sorted by cumulative duration, followed by a total over every
//! sample:
//!
//! ```text
//! Name                                     |        Min |        Max |        Avg |      Cumul |    Calls
//! -------------------------------------------------------------------------------------------------------
//! world::physics::step                     |   249.60us |     1.20ms |   512.00us |     5.12ms |       10
//! -------------------------------------------------------------------------------------------------------
//! Total                                    |   249.60us |     1.20ms |   512.00us |     5.12ms |       10
//! ```
//!
//! By default, the report is written to the `tracing` log at info level. Provide a
//! [`ReportSink`] via [`Engine::builder()`] to send it elsewhere.
//!
//! # Overlapping captures
//!
//! Only one capture runs at a time. What happens when another one is requested while a
//! capture is running is controlled by [`OverlapPolicy`].
//!
//! # Without an engine
//!
//! Code that may run in a host without instrumentation can hold an [`Instrumentation`],
//! which is either an engine or nothing.

mod clock;
mod command;
mod engine;
mod engine_builder;
mod error;
mod format;
mod instrumentation;
mod registry;
mod report;
mod session;
mod sink;
mod stats;
mod tag;
mod timer;

pub use clock::*;
pub use command::*;
pub use engine::*;
pub use engine_builder::*;
pub use error::*;
pub use format::*;
pub use instrumentation::*;
pub(crate) use registry::*;
pub use report::*;
pub(crate) use session::*;
pub use sink::*;
pub use stats::*;
pub use tag::*;
pub use timer::*;
