use std::sync::Arc;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::model::{clamp_progress, clamp_scale};
use crate::ontology::{NoteType, Tag};
use crate::utils::{mangle_heading, time};

/// One heading-delimited section of an outline.
///
/// Notes carry no parent/child references; nesting is encoded entirely by
/// `depth` plus document order (see `Outline`). The body is kept as the raw
/// byte run between this heading line and the next one, verbatim, which is
/// what makes Markdown-dialect round-trips byte-exact.
#[derive(Debug, Clone)]
pub struct Note {
    id: Uuid,
    name: String,
    depth: usize,
    note_type: Arc<NoteType>,
    tags: Vec<Arc<Tag>>,
    reads: u32,
    revision: u32,
    created: NaiveDateTime,
    modified: NaiveDateTime,
    read: NaiveDateTime,
    progress: u8,
    importance: u8,
    urgency: u8,
    body: String,
    /// Original heading line (with newline), valid only while name and
    /// depth are untouched since parse. `None` forces re-rendering.
    raw_heading: Option<String>,
    /// Set by mutations; drives the Native-dialect modified/revision
    /// refresh at serialize time.
    dirty: bool,
}

impl Note {
    /// A freshly authored note: never read, revision zero.
    pub(crate) fn new(name: String, depth: usize, note_type: Arc<NoteType>) -> Self {
        let now = time::now();
        Self {
            id: Uuid::new_v4(),
            name,
            depth,
            note_type,
            tags: Vec::new(),
            reads: 0,
            revision: 0,
            created: now,
            modified: now,
            read: now,
            progress: 0,
            importance: 0,
            urgency: 0,
            body: String::new(),
            raw_heading: None,
            dirty: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Anchor-safe identifier derived from the name.
    pub fn mangled_name(&self) -> String {
        mangle_heading(&self.name)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn note_type(&self) -> &Arc<NoteType> {
        &self.note_type
    }

    pub fn tags(&self) -> &[Arc<Tag>] {
        &self.tags
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.iter().any(|t| t.key() == key)
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }

    pub fn revision(&self) -> u32 {
        self.revision
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

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn importance(&self) -> u8 {
        self.importance
    }

    pub fn urgency(&self) -> u8 {
        self.urgency
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    // --- mutations -------------------------------------------------------

    pub fn set_name(&mut self, name: &str) {
        if self.name != name {
            self.name = name.to_string();
            self.raw_heading = None;
            self.mark_dirty();
        }
    }

    pub fn set_body(&mut self, body: &str) {
        if self.body != body {
            self.body = body.to_string();
            self.mark_dirty();
        }
    }

    pub fn set_note_type(&mut self, note_type: Arc<NoteType>) {
        self.note_type = note_type;
        self.mark_dirty();
    }

    pub fn set_tags(&mut self, tags: Vec<Arc<Tag>>) {
        self.tags = tags;
        self.mark_dirty();
    }

    pub fn add_tag(&mut self, tag: Arc<Tag>) {
        if !self.has_tag(tag.key()) {
            self.tags.push(tag);
            self.mark_dirty();
        }
    }

    pub fn set_progress(&mut self, progress: u8) {
        self.progress = clamp_progress(progress);
        self.mark_dirty();
    }

    pub fn set_importance(&mut self, importance: u8) {
        self.importance = clamp_scale(importance);
        self.mark_dirty();
    }

    pub fn set_urgency(&mut self, urgency: u8) {
        self.urgency = clamp_scale(urgency);
        self.mark_dirty();
    }

    /// Record one read access. Does not mark the note dirty: reading is
    /// not a content change, the counter is persisted with the next save.
    pub fn touch_read(&mut self) {
        self.reads += 1;
        self.read = time::now();
    }

    // --- crate-internal plumbing ----------------------------------------

    pub(crate) fn set_depth(&mut self, depth: usize) {
        if self.depth != depth {
            self.depth = depth;
            self.raw_heading = None;
            self.mark_dirty();
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Bump revision/modified; called by the Native serializer for dirty
    /// notes right before rendering.
    pub(crate) fn refresh_on_save(&mut self) {
        self.revision += 1;
        self.modified = time::now();
        self.dirty = false;
    }

    pub(crate) fn raw_heading(&self) -> Option<&str> {
        self.raw_heading.as_deref()
    }

    /// Copy for `clone_note`: verbatim name/type/tags/body and depth,
    /// fresh identity and timestamps, counters reset to "read once".
    pub(crate) fn clone_with_reset(&self) -> Self {
        let now = time::now();
        Self {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            depth: self.depth,
            note_type: Arc::clone(&self.note_type),
            tags: self.tags.clone(),
            reads: 1,
            revision: 1,
            created: now,
            modified: now,
            read: now,
            progress: self.progress,
            importance: self.importance,
            urgency: self.urgency,
            body: self.body.clone(),
            raw_heading: self.raw_heading.clone(),
            dirty: false,
        }
    }

    /// Constructor used by the codec while parsing.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parse(
        name: String,
        depth: usize,
        note_type: Arc<NoteType>,
        tags: Vec<Arc<Tag>>,
        reads: u32,
        revision: u32,
        created: NaiveDateTime,
        modified: NaiveDateTime,
        read: NaiveDateTime,
        progress: u8,
        importance: u8,
        urgency: u8,
        body: String,
        raw_heading: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            depth,
            note_type,
            tags,
            reads,
            revision,
            created,
            modified,
            read,
            progress: clamp_progress(progress),
            importance: clamp_scale(importance),
            urgency: clamp_scale(urgency),
            body,
            raw_heading: Some(raw_heading),
            dirty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::Ontology;

    #[test]
    fn test_new_note_is_never_read() {
        let ontology = Ontology::new();
        let note = Note::new("Idea".to_string(), 0, ontology.default_note_type());
        assert_eq!(note.reads(), 0);
        assert_eq!(note.revision(), 0);
        assert!(!note.is_dirty());
        assert_eq!(note.created(), note.modified());
    }

    #[test]
    fn test_clone_with_reset() {
        let ontology = Ontology::new();
        let mut note = Note::new("Original".to_string(), 2, ontology.default_note_type());
        note.set_body("body text\n");
        note.add_tag(ontology.find_or_create_tag("cool"));
        note.touch_read();
        note.touch_read();

        let copy = note.clone_with_reset();
        assert_ne!(copy.id(), note.id());
        assert_eq!(copy.name(), "Original");
        assert_eq!(copy.depth(), 2);
        assert_eq!(copy.body(), "body text\n");
        assert!(copy.has_tag("cool"));
        assert_eq!(copy.reads(), 1);
        assert_eq!(copy.revision(), 1);
        assert!(!copy.is_dirty());
    }

    #[test]
    fn test_mutations_mark_dirty() {
        let ontology = Ontology::new();
        let mut note = Note::new("A".to_string(), 0, ontology.default_note_type());
        note.set_name("B");
        assert!(note.is_dirty());
        assert!(note.raw_heading().is_none());

        note.refresh_on_save();
        assert!(!note.is_dirty());
        assert_eq!(note.revision(), 1);
    }

    #[test]
    fn test_attribute_clamping() {
        let ontology = Ontology::new();
        let mut note = Note::new("A".to_string(), 0, ontology.default_note_type());
        note.set_importance(9);
        note.set_progress(150);
        assert_eq!(note.importance(), 5);
        assert_eq!(note.progress(), 100);
    }

    #[test]
    fn test_mangled_name() {
        let ontology = Ontology::new();
        let note = Note::new(
            "Section with 123 number".to_string(),
            0,
            ontology.default_note_type(),
        );
        assert_eq!(note.mangled_name(), "section-with-123-number");
    }
}
