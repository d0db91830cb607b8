use crate::error::{MnemoError, Result};
use crate::model::Dialect;
use crate::note::Note;
use crate::outline::Outline;

use super::metadata::MetadataBlock;

fn note_metadata(note: &Note) -> MetadataBlock {
    MetadataBlock {
        note_type: Some(note.note_type().key().to_string()),
        created: Some(note.created()),
        read: Some(note.read()),
        modified: Some(note.modified()),
        reads: Some(note.reads()),
        revision: Some(note.revision()),
        importance: Some(note.importance()),
        urgency: Some(note.urgency()),
        progress: Some(note.progress()),
        tags: note.tags().iter().map(|t| t.key().to_string()).collect(),
    }
}

fn outline_metadata(outline: &Outline) -> MetadataBlock {
    MetadataBlock {
        note_type: Some(crate::ontology::NoteType::OUTLINE.to_string()),
        created: Some(outline.created()),
        read: Some(outline.read()),
        modified: Some(outline.modified()),
        reads: Some(outline.reads()),
        revision: Some(outline.revision()),
        importance: Some(outline.importance()),
        urgency: Some(outline.urgency()),
        progress: None,
        tags: Vec::new(),
    }
}

fn heading_prefix(depth: usize) -> String {
    "#".repeat(depth + 2)
}

fn check_writable(outline: &Outline) -> Result<()> {
    let bad_name = |name: &str| name.contains('\n') || name.contains('\r');
    if bad_name(outline.name()) {
        return Err(MnemoError::Corrupt {
            key: outline.key().to_string(),
            reason: "title contains a line break".to_string(),
        });
    }
    for (i, note) in outline.notes().iter().enumerate() {
        if bad_name(note.name()) {
            return Err(MnemoError::Corrupt {
                key: outline.key().to_string(),
                reason: format!("note {} name contains a line break", i),
            });
        }
    }
    Ok(())
}

/// Serialize an outline back to document text.
///
/// Native dialect: every heading line gets a metadata comment; notes whose
/// in-memory state changed since the last parse/save get their `modified`
/// timestamp and `revision` refreshed first (and the outline's own title
/// metadata likewise).
///
/// Markdown dialect: metadata is never emitted, mutated or not. Untouched
/// segments are re-emitted from the raw bytes captured at parse time, so
/// an unmodified document serializes byte-identically to its source.
///
/// Serialization is strict: state that cannot be represented as a heading
/// line (a name with a line break) fails with `Corrupt` before anything is
/// refreshed.
pub fn render_outline(outline: &mut Outline) -> Result<String> {
    check_writable(outline)?;

    match outline.dialect() {
        Dialect::Markdown => Ok(render_markdown(outline)),
        Dialect::Native => Ok(render_native(outline)),
    }
}

fn render_markdown(outline: &Outline) -> String {
    let mut out = String::new();
    out.push_str(outline.preamble());

    match outline.title_raw() {
        Some(raw) => out.push_str(raw),
        None => {
            out.push_str("# ");
            out.push_str(outline.name());
            out.push('\n');
        }
    }
    out.push_str(outline.description());

    for note in outline.notes() {
        match note.raw_heading() {
            Some(raw) => out.push_str(raw),
            None => {
                out.push_str(&heading_prefix(note.depth()));
                out.push(' ');
                out.push_str(note.name());
                out.push('\n');
            }
        }
        out.push_str(note.body());
    }
    out
}

fn render_native(outline: &mut Outline) -> String {
    if outline.is_dirty() {
        outline.refresh_on_save();
    }
    for note in outline.notes_mut_slice() {
        if note.is_dirty() {
            note.refresh_on_save();
        }
    }

    let mut out = String::new();
    out.push_str(outline.preamble());

    out.push_str("# ");
    out.push_str(outline.name());
    out.push(' ');
    out.push_str(&outline_metadata(outline).render());
    out.push('\n');
    out.push_str(outline.description());

    for note in outline.notes() {
        out.push_str(&heading_prefix(note.depth()));
        out.push(' ');
        out.push_str(note.name());
        out.push(' ');
        out.push_str(&note_metadata(note).render());
        out.push('\n');
        out.push_str(note.body());
    }
    out
}
