use std::fmt::{self, Write};
use std::time::Duration;

/// Unit divisors in nanoseconds, coarsest first.
const UNITS: &[(u128, &str)] = &[
    (1_000_000_000, "s"),
    (1_000_000, "ms"),
    (1_000, "us"),
    (1, "ns"),
];

/// Renders a duration in the coarsest unit in which its magnitude is at least 1,
/// with two decimal places.
///
/// Supports width and alignment flags, so it can be used directly in table layouts.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use scope_watch::HumanDuration;
///
/// assert_eq!(HumanDuration::from(Duration::from_nanos(249_600)).to_string(), "249.60us");
/// assert_eq!(HumanDuration::from(Duration::from_millis(4_140)).to_string(), "4.14s");
/// assert_eq!(HumanDuration::from(Duration::ZERO).to_string(), "0.00ns");
/// assert_eq!(format!("[{:>9}]", HumanDuration::from(Duration::from_micros(1))), "[   1.00us]");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HumanDuration {
    duration: Duration,
}

impl From<Duration> for HumanDuration {
    fn from(duration: Duration) -> Self {
        Self { duration }
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.duration.as_nanos();

        let mut chosen = (1, "ns");
        let mut coarser = None;

        for &(divisor, suffix) in UNITS {
            if nanos >= divisor {
                chosen = (divisor, suffix);
                break;
            }

            coarser = Some((divisor, suffix));
        }

        let (divisor, suffix) = chosen;
        let hundredths = rounded_hundredths(nanos, divisor);

        // Rounding can carry into the next unit: 999.995us is 1.00ms, not 1000.00us.
        let (hundredths, suffix) = match coarser {
            Some((coarser_divisor, coarser_suffix)) if hundredths >= 100_000 => (
                rounded_hundredths(nanos, coarser_divisor),
                coarser_suffix,
            ),
            _ => (hundredths, suffix),
        };

        // Render first, then pad, so that width flags apply to the value and suffix together.
        let mut rendered = String::with_capacity(16);
        write!(
            rendered,
            "{}.{:02}{suffix}",
            hundredths / 100,
            hundredths % 100
        )?;

        f.pad(&rendered)
    }
}

/// `nanos / divisor` in hundredths, rounded half up.
fn rounded_hundredths(nanos: u128, divisor: u128) -> u128 {
    nanos
        .saturating_mul(100)
        .saturating_add(divisor / 2)
        .checked_div(divisor)
        .unwrap_or_default()
}
