use serde::{Deserialize, Serialize};

/// Document dialect.
///
/// `Native` documents carry a metadata comment on every heading line and may
/// be rewritten freely on save. `Markdown` documents never carry metadata
/// and must round-trip byte-identically when saved unmodified.
///
/// A repository classification only produces a *hint*; the authoritative
/// dialect is resolved after parsing (metadata present anywhere makes the
/// document `Native`, and that classification is sticky for its lifetime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    Native,
    Markdown,
}

/// Minimal description of the effect of the last structural edit.
///
/// Indices are inclusive positions in the outline's flat note sequence at
/// the time the operation returned. This is a per-call value, not a log;
/// callers needing history capture it themselves. Deletions produce no
/// patch at all — callers refresh wholesale after a forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Patch {
    /// Nothing happened (no-op edit, e.g. promoting a top-level note).
    None,
    /// Notes in `start..=end` changed in place; ordering is intact.
    Changed { start: usize, end: usize },
    /// Notes in `start..=end` were reordered.
    Moved { start: usize, end: usize },
}

impl Patch {
    /// Inclusive index range touched by the edit, if any.
    pub fn range(&self) -> Option<(usize, usize)> {
        match *self {
            Patch::None => None,
            Patch::Changed { start, end } | Patch::Moved { start, end } => Some((start, end)),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Patch::None)
    }
}

/// Upper bound for the importance/urgency attributes (`N/5` in metadata).
pub const SCALE_MAX: u8 = 5;

/// Upper bound for the progress attribute (`N%` in metadata).
pub const PROGRESS_MAX: u8 = 100;

pub(crate) fn clamp_scale(value: u8) -> u8 {
    value.min(SCALE_MAX)
}

pub(crate) fn clamp_progress(value: u8) -> u8 {
    value.min(PROGRESS_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_range() {
        assert_eq!(Patch::None.range(), None);
        assert_eq!(Patch::Changed { start: 2, end: 2 }.range(), Some((2, 2)));
        assert_eq!(Patch::Moved { start: 0, end: 8 }.range(), Some((0, 8)));
    }

    #[test]
    fn test_attribute_clamping() {
        assert_eq!(clamp_scale(3), 3);
        assert_eq!(clamp_scale(9), SCALE_MAX);
        assert_eq!(clamp_progress(20), 20);
        assert_eq!(clamp_progress(250), PROGRESS_MAX);
    }
}
