use chrono::NaiveDateTime;

use crate::model::{clamp_scale, Dialect};
use crate::note::Note;
use crate::utils::time;

mod edit;


/// One Markdown document: a title plus an ordered, depth-annotated sequence
/// of notes.
///
/// There is no pointer tree. A note's subtree is the maximal contiguous run
/// of immediately following notes whose depth is strictly greater than its
/// own — `subtree_end` derives it on demand and every structural operation
/// is built on top of it. Indices refer to current positions; callers must
/// re-resolve them after any mutating call.
#[derive(Debug)]
pub struct Outline {
    /// Backing file path, also the lookup key in the owning collection.
    key: String,
    name: String,
    dialect: Dialect,
    created: NaiveDateTime,
    modified: NaiveDateTime,
    read: NaiveDateTime,
    reads: u32,
    revision: u32,
    importance: u8,
    urgency: u8,
    /// Raw bytes before the title heading (rare, preserved verbatim).
    preamble: String,
    /// Raw bytes between the title line and the first note heading.
    description: String,
    /// Original title line, valid while the name is untouched.
    title_raw: Option<String>,
    notes: Vec<Note>,
    /// Digest of the source text at parse time; saves compare against it
    /// to skip rewriting unmodified files.
    source_digest: Option<String>,
    dirty: bool,
}

impl Outline {
    /// Empty skeleton for a document that does not exist on disk yet.
    pub fn new(key: String, name: String, dialect: Dialect) -> Self {
        let now = time::now();
        Self {
            key,
            name,
            dialect,
            created: now,
            modified: now,
            read: now,
            reads: 0,
            revision: 0,
            importance: 0,
            urgency: 0,
            preamble: String::new(),
            description: "\n".to_string(),
            title_raw: None,
            notes: Vec::new(),
            source_digest: None,
            dirty: true,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parse(
        key: String,
        name: String,
        dialect: Dialect,
        created: NaiveDateTime,
        modified: NaiveDateTime,
        read: NaiveDateTime,
        reads: u32,
        revision: u32,
        importance: u8,
        urgency: u8,
        preamble: String,
        description: String,
        title_raw: Option<String>,
        notes: Vec<Note>,
        source_digest: String,
    ) -> Self {
        Self {
            key,
            name,
            dialect,
            created,
            modified,
            read,
            reads,
            revision,
            importance: clamp_scale(importance),
            urgency: clamp_scale(urgency),
            preamble,
            description,
            title_raw,
            notes,
            source_digest: Some(source_digest),
            dirty: false,
        }
    }

    // --- queries ---------------------------------------------------------

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notes_count(&self) -> usize {
        self.notes.len()
    }

    pub fn note(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    /// Direct mutable access for content edits (name, body, attributes).
    /// Structural edits go through the dedicated operations instead.
    pub fn note_mut(&mut self, index: usize) -> Option<&mut Note> {
        self.notes.get_mut(index)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created(&self) -> NaiveDateTime {
        self.created
    }

    pub fn modified(&self) -> NaiveDateTime {
        self.modified
    }

    pub fn read(&self) -> NaiveDateTime {
        self.read
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn importance(&self) -> u8 {
        self.importance
    }

    pub fn urgency(&self) -> u8 {
        self.urgency
    }

    /// Index of the last note of the subtree rooted at `index`, inclusive.
    ///
    /// Equals `index` itself when the note has no children. Every
    /// structural operation derives subtree membership through this one
    /// helper instead of maintaining redundant tree pointers.
    pub fn subtree_end(&self, index: usize) -> usize {
        let depth = self.notes[index].depth();
        let mut end = index;
        while end + 1 < self.notes.len() && self.notes[end + 1].depth() > depth {
            end += 1;
        }
        end
    }

    /// Number of notes in the subtree rooted at `index`, root included.
    pub fn subtree_size(&self, index: usize) -> usize {
        self.subtree_end(index) - index + 1
    }

    // --- content mutations -----------------------------------------------

    pub fn set_name(&mut self, name: &str) {
        if self.name != name {
            self.name = name.to_string();
            self.title_raw = None;
            self.dirty = true;
        }
    }

    pub fn set_description(&mut self, description: &str) {
        if self.description != description {
            self.description = description.to_string();
            self.dirty = true;
        }
    }

    pub fn set_importance(&mut self, importance: u8) {
        self.importance = clamp_scale(importance);
        self.dirty = true;
    }

    pub fn set_urgency(&mut self, urgency: u8) {
        self.urgency = clamp_scale(urgency);
        self.dirty = true;
    }

    pub fn touch_read(&mut self) {
        self.reads += 1;
        self.read = time::now();
    }

    // --- crate-internal plumbing ----------------------------------------

    pub(crate) fn notes_mut_slice(&mut self) -> &mut [Note] {
        &mut self.notes
    }

    #[cfg(test)]
    pub(crate) fn notes_vec_mut(&mut self) -> &mut Vec<Note> {
        &mut self.notes
    }

    pub(crate) fn preamble(&self) -> &str {
        &self.preamble
    }

    pub(crate) fn title_raw(&self) -> Option<&str> {
        self.title_raw.as_deref()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// The document changed since the last parse/save if the outline
    /// itself or any of its notes carries a dirty flag.
    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty || self.notes.iter().any(|n| n.is_dirty())
    }

    pub(crate) fn refresh_on_save(&mut self) {
        self.revision += 1;
        self.modified = time::now();
        self.dirty = false;
    }

    pub(crate) fn source_digest(&self) -> Option<&str> {
        self.source_digest.as_deref()
    }

    pub(crate) fn set_source_digest(&mut self, digest: String) {
        self.source_digest = Some(digest);
    }
}
