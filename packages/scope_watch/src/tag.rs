use std::borrow::Borrow;
use std::fmt;

/// Joins the segments of a [`Tag`].
pub const SEPARATOR: &str = "::";

/// The name under which timing samples are aggregated.
///
/// A tag is formed by joining one or more segments with [`SEPARATOR`]. Two tags are equal
/// if and only if their joined strings are equal. The separator carries no hierarchical
/// meaning: `A::B` and `A` are unrelated tags even though one is a textual prefix of the other.
///
/// # Examples
///
/// ```
/// use scope_watch::Tag;
///
/// let tag = Tag::from_segments(&["net", "connect"]);
/// assert_eq!(tag.as_str(), "net::connect");
///
/// assert_eq!(tag, Tag::from_segments(&["net::connect"]));
/// assert_ne!(tag, Tag::from_segments(&["net"]));
/// ```
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tag {
    name: Box<str>,
}

impl Tag {
    /// Creates a tag by joining `segments` with [`SEPARATOR`].
    ///
    /// An empty segment list produces the empty tag.
    #[must_use]
    pub fn from_segments<S>(segments: &[S]) -> Self
    where
        S: AsRef<str>,
    {
        let capacity = segments
            .iter()
            .map(|s| s.as_ref().len())
            .fold(0_usize, usize::saturating_add)
            .saturating_add(
                SEPARATOR
                    .len()
                    .saturating_mul(segments.len().saturating_sub(1)),
            );

        let mut name = String::with_capacity(capacity);

        for (index, segment) in segments.iter().enumerate() {
            if index != 0 {
                name.push_str(SEPARATOR);
            }

            name.push_str(segment.as_ref());
        }

        Self {
            name: name.into_boxed_str(),
        }
    }

    /// The joined tag string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self {
            name: value.into(),
        }
    }
}
