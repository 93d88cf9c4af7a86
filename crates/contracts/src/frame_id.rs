//! FrameId - Cheap-to-clone frame identifier
//!
//! Uses Arc<str> internally so the id can be shared between the recency
//! store, outbound frame messages and log fields without reallocating.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Frame identifier with cheap cloning.
///
/// Ids produced by the capture loop have the form `frame_<seq>`; ids arriving
/// from the remote side are opaque strings and only compared for equality.
///
/// # Examples
/// ```
/// use contracts::FrameId;
///
/// let id = FrameId::from_sequence(5);
/// assert_eq!(id.as_str(), "frame_5");
/// assert_eq!(id, FrameId::from("frame_5"));
/// ```
#[derive(Clone, Default)]
pub struct FrameId(Arc<str>);

impl FrameId {
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Build the id for the n-th captured frame of a session.
    pub fn from_sequence(seq: u64) -> Self {
        Self(Arc::from(format!("frame_{seq}")))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for FrameId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for FrameId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FrameId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FrameId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for FrameId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl PartialEq for FrameId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same allocation
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for FrameId {}

impl PartialEq<str> for FrameId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for FrameId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

// Must hash like `str` so `HashMap<FrameId, _>::get(&str)` works via Borrow.
impl Hash for FrameId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({:?})", &*self.0)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for FrameId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FrameId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
