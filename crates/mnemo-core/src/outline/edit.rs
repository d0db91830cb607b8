use std::sync::Arc;

use crate::error::{MnemoError, Result};
use crate::model::Patch;
use crate::note::Note;
use crate::ontology::{NoteType, Tag};
use crate::stencil::Stencil;

use super::Outline;

/// Structural edit operations.
///
/// All of them work on the flat note sequence, shift whole subtrees
/// together and report their effect as a `Patch` return value. Indices are
/// validated first; a precondition failure returns `InvalidOperation` and
/// leaves the sequence untouched.
impl Outline {
    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.notes.len() {
            return Err(MnemoError::InvalidOperation(format!(
                "no note at index {} in '{}' ({} notes)",
                index,
                self.key,
                self.notes.len()
            )));
        }
        Ok(())
    }

    /// Decrease the depth of the note and its whole subtree by one.
    /// Floors at depth 0: promoting a top-level note is a no-op.
    pub fn promote_note(&mut self, index: usize) -> Result<Patch> {
        self.check_index(index)?;
        if self.notes[index].depth() == 0 {
            return Ok(Patch::None);
        }

        let end = self.subtree_end(index);
        for note in &mut self.notes[index..=end] {
            let depth = note.depth();
            note.set_depth(depth - 1);
        }
        self.dirty = true;
        Ok(Patch::Changed { start: index, end })
    }

    /// Increase the depth of the note and its whole subtree by one.
    ///
    /// Only allowed when the result still has a parent to attach to: the
    /// first note, and a note already deeper than its predecessor, cannot
    /// demote (no-op). This keeps the "no orphan jump" depth invariant.
    pub fn demote_note(&mut self, index: usize) -> Result<Patch> {
        self.check_index(index)?;
        if index == 0 || self.notes[index - 1].depth() < self.notes[index].depth() {
            return Ok(Patch::None);
        }

        let end = self.subtree_end(index);
        for note in &mut self.notes[index..=end] {
            let depth = note.depth();
            note.set_depth(depth + 1);
        }
        self.dirty = true;
        Ok(Patch::Changed { start: index, end })
    }

    /// Swap the note's subtree with the nearest preceding sibling subtree.
    /// No-op when the note is first among its siblings.
    pub fn move_note_up(&mut self, index: usize) -> Result<Patch> {
        self.check_index(index)?;
        let depth = self.notes[index].depth();

        let mut sibling = None;
        for j in (0..index).rev() {
            let d = self.notes[j].depth();
            if d < depth {
                break;
            }
            if d == depth {
                sibling = Some(j);
                break;
            }
        }
        let Some(sibling) = sibling else {
            return Ok(Patch::None);
        };

        let end = self.subtree_end(index);
        // The sibling subtree occupies sibling..index, ours index..=end;
        // rotating the union left moves ours in front of the sibling.
        self.notes[sibling..=end].rotate_left(index - sibling);
        self.dirty = true;
        Ok(Patch::Moved {
            start: sibling,
            end,
        })
    }

    /// Swap the note's subtree with the nearest following sibling subtree.
    /// No-op when the note is last among its siblings.
    pub fn move_note_down(&mut self, index: usize) -> Result<Patch> {
        self.check_index(index)?;
        let depth = self.notes[index].depth();
        let end = self.subtree_end(index);

        if end + 1 >= self.notes.len() || self.notes[end + 1].depth() < depth {
            return Ok(Patch::None);
        }

        let sibling_end = self.subtree_end(end + 1);
        self.notes[index..=sibling_end].rotate_left(end + 1 - index);
        self.dirty = true;
        Ok(Patch::Moved {
            start: index,
            end: sibling_end,
        })
    }

    /// Relocate the note's subtree to the very start of the document,
    /// keeping its internal order and depths. No-op if already there.
    pub fn move_note_to_first(&mut self, index: usize) -> Result<Patch> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(Patch::None);
        }

        let end = self.subtree_end(index);
        self.notes[0..=end].rotate_right(end - index + 1);
        self.dirty = true;
        Ok(Patch::Moved { start: 0, end })
    }

    /// Relocate the note's subtree to the very end of the document,
    /// keeping its internal order and depths. No-op if already there.
    pub fn move_note_to_last(&mut self, index: usize) -> Result<Patch> {
        self.check_index(index)?;
        let end = self.subtree_end(index);
        let last = self.notes.len() - 1;
        if end == last {
            return Ok(Patch::None);
        }

        self.notes[index..].rotate_left(end - index + 1);
        self.dirty = true;
        Ok(Patch::Moved { start: index, end: last })
    }

    /// Duplicate the note and its whole subtree, inserting the copy right
    /// after the original subtree at the same depths. Clones keep
    /// name/type/tags/body verbatim but get fresh identity and timestamps
    /// and reset counters (reads = 1, revision = 1). Returns the clone.
    pub fn clone_note(&mut self, index: usize) -> Result<&Note> {
        self.check_index(index)?;
        let end = self.subtree_end(index);

        let clones: Vec<Note> = self.notes[index..=end]
            .iter()
            .map(Note::clone_with_reset)
            .collect();
        let at = end + 1;
        self.notes.splice(at..at, clones);
        self.dirty = true;
        Ok(&self.notes[at])
    }

    /// Remove the note and its whole subtree. Returns the number of notes
    /// removed. Deletions produce no Patch by contract (callers re-render
    /// wholesale after a forget).
    pub fn forget_note(&mut self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        Ok(self.take_subtree(index).len())
    }

    /// Insert a freshly authored note at the given flat offset.
    ///
    /// The note inherits the depth of the note previously at that position
    /// (depth 0 when appending at the end). A stencil, when supplied,
    /// seeds the body. New notes start with reads = 0 and revision = 0 —
    /// unlike clones they have never been read.
    pub fn insert_note(
        &mut self,
        offset: usize,
        name: &str,
        note_type: Arc<NoteType>,
        tags: Vec<Arc<Tag>>,
        stencil: Option<&Stencil>,
    ) -> Result<&Note> {
        let offset = offset.min(self.notes.len());
        let depth = if offset < self.notes.len() {
            self.notes[offset].depth()
        } else {
            0
        };

        let mut note = Note::new(name.to_string(), depth, note_type);
        if !tags.is_empty() {
            note.set_tags(tags);
        }
        if let Some(stencil) = stencil {
            note.set_body(stencil.body());
        }

        self.notes.insert(offset, note);
        self.dirty = true;
        Ok(&self.notes[offset])
    }

    /// Detach the subtree rooted at `index`. Used by `forget_note` and by
    /// the cross-document refactoring in `Memory`.
    pub(crate) fn take_subtree(&mut self, index: usize) -> Vec<Note> {
        let end = self.subtree_end(index);
        self.dirty = true;
        self.notes.drain(index..=end).collect()
    }

    /// Append a detached subtree at the end of the sequence, rebasing the
    /// root to depth 0 while preserving the internal relative depths.
    pub(crate) fn append_subtree(&mut self, subtree: Vec<Note>) {
        let Some(root_depth) = subtree.first().map(Note::depth) else {
            return;
        };
        for mut note in subtree {
            let depth = note.depth();
            note.set_depth(depth - root_depth);
            self.notes.push(note);
        }
        self.dirty = true;
    }
}
