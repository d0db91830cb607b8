use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A label attached to notes. Shared by reference; two notes tagged
/// "important" hold the same `Arc<Tag>`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    key: String,
}

impl Tag {
    pub const IMPORTANT: &'static str = "important";
    pub const COOL: &'static str = "cool";
    pub const TODO: &'static str = "todo";

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// The kind of a note (plain note, action item, ...).
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct NoteType {
    key: String,
}

impl NoteType {
    pub const NOTE: &'static str = "Note";
    pub const OUTLINE: &'static str = "Outline";
    pub const ACTION: &'static str = "Action";

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Tag and note-type registries.
///
/// Both registries are append-only and deduplicating: `find_or_create_*`
/// is idempotent and safe to call from concurrent parses. Lookups hand out
/// `Arc` references, never copies, so identity comparison works across
/// documents.
#[derive(Debug)]
pub struct Ontology {
    tags: RwLock<HashMap<String, Arc<Tag>>>,
    types: RwLock<HashMap<String, Arc<NoteType>>>,
}

impl Ontology {
    pub fn new() -> Self {
        let ontology = Self {
            tags: RwLock::new(HashMap::new()),
            types: RwLock::new(HashMap::new()),
        };
        // Well-known vocabulary is always present.
        ontology.find_or_create_type(NoteType::NOTE);
        ontology.find_or_create_type(NoteType::OUTLINE);
        ontology.find_or_create_type(NoteType::ACTION);
        ontology.find_or_create_tag(Tag::IMPORTANT);
        ontology.find_or_create_tag(Tag::COOL);
        ontology.find_or_create_tag(Tag::TODO);
        ontology
    }

    pub fn find_or_create_tag(&self, key: &str) -> Arc<Tag> {
        if let Some(tag) = self.tags.read().unwrap().get(key) {
            return Arc::clone(tag);
        }

        let mut tags = self.tags.write().unwrap();
        Arc::clone(tags.entry(key.to_string()).or_insert_with(|| {
            Arc::new(Tag {
                key: key.to_string(),
            })
        }))
    }

    pub fn find_or_create_type(&self, key: &str) -> Arc<NoteType> {
        if let Some(t) = self.types.read().unwrap().get(key) {
            return Arc::clone(t);
        }

        let mut types = self.types.write().unwrap();
        Arc::clone(types.entry(key.to_string()).or_insert_with(|| {
            Arc::new(NoteType {
                key: key.to_string(),
            })
        }))
    }

    pub fn tag(&self, key: &str) -> Option<Arc<Tag>> {
        self.tags.read().unwrap().get(key).map(Arc::clone)
    }

    pub fn note_type(&self, key: &str) -> Option<Arc<NoteType>> {
        self.types.read().unwrap().get(key).map(Arc::clone)
    }

    /// Default type for freshly parsed/authored notes.
    pub fn default_note_type(&self) -> Arc<NoteType> {
        self.find_or_create_type(NoteType::NOTE)
    }
}

impl Default for Ontology {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_or_create_is_deduplicating() {
        let ontology = Ontology::new();
        let a = ontology.find_or_create_tag("grow");
        let b = ontology.find_or_create_tag("grow");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.key(), "grow");
    }

    #[test]
    fn test_well_known_vocabulary_present() {
        let ontology = Ontology::new();
        assert!(ontology.tag(Tag::IMPORTANT).is_some());
        assert!(ontology.note_type(NoteType::NOTE).is_some());
        assert!(ontology.note_type(NoteType::ACTION).is_some());
        assert!(ontology.tag("nonexistent").is_none());
    }

    #[test]
    fn test_concurrent_find_or_create() {
        let ontology = Arc::new(Ontology::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let ontology = Arc::clone(&ontology);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    ontology.find_or_create_tag(&format!("tag-{}", i % 10));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let a = ontology.tag("tag-3").unwrap();
        let b = ontology.find_or_create_tag("tag-3");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
