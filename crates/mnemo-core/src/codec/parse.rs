use std::path::Path;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::error::{MnemoError, Result};
use crate::model::Dialect;
use crate::note::Note;
use crate::ontology::Ontology;
use crate::outline::Outline;
use crate::utils::time;
use crate::vfs::FileSystem;

use super::metadata::MetadataBlock;
use super::compute_digest;

/// One heading as found in the source, with the byte extent of its full
/// line(s) so raw segments can be sliced around it.
struct RawHeading {
    level: u8,
    text: String,
    metadata: Option<MetadataBlock>,
    /// Byte offset of the heading's first line start.
    start: usize,
    /// Byte offset just past the heading's last line, newline included.
    end: usize,
}

fn line_start_at(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// First index past the newline at-or-after `offset` (or end of text).
fn line_end_at(text: &str, offset: usize) -> usize {
    match text[offset..].find('\n') {
        Some(i) => offset + i + 1,
        None => text.len(),
    }
}

fn collect_headings(text: &str) -> Vec<RawHeading> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options);

    let mut headings = Vec::new();
    let mut in_heading = false;
    let mut level = 0u8;
    let mut collected = String::new();
    let mut metadata: Option<MetadataBlock> = None;
    let mut start = 0usize;

    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level: l, .. }) => {
                in_heading = true;
                level = l as u8;
                collected.clear();
                metadata = None;
                start = line_start_at(text, range.start);
            }
            Event::End(TagEnd::Heading(..)) => {
                if in_heading {
                    let end = line_end_at(text, range.end.saturating_sub(1).max(start));
                    headings.push(RawHeading {
                        level,
                        text: collected.trim().to_string(),
                        metadata: metadata.take(),
                        start,
                        end,
                    });
                }
                in_heading = false;
            }
            Event::Text(t) if in_heading => collected.push_str(&t),
            Event::Code(t) if in_heading => {
                collected.push('`');
                collected.push_str(&t);
                collected.push('`');
            }
            Event::InlineHtml(html) | Event::Html(html) if in_heading => {
                if MetadataBlock::is_metadata_comment(&html) {
                    metadata = MetadataBlock::parse(&html);
                } else {
                    collected.push_str(&html);
                }
            }
            _ => {}
        }
    }
    headings
}

fn outline_name_from_key(key: &str) -> String {
    Path::new(key)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Parse a document into an outline.
///
/// The first heading is the title; every later heading of any level is a
/// note. The first note heading's level establishes depth 0 and deeper
/// levels increase depth from there; upward jumps are capped at
/// predecessor depth + 1 so the sequence never contains an orphan.
///
/// `hint` is only consulted when no heading carries metadata: a document
/// inside a recognized native tree stays `Native` (re-saving writes
/// metadata, nothing is lost), everything else resolves `Markdown`.
/// Metadata anywhere makes the document `Native` regardless of the hint,
/// and that classification is sticky.
pub fn parse_outline(text: &str, key: &str, hint: Dialect, ontology: &Ontology) -> Outline {
    let headings = collect_headings(text);
    let digest = compute_digest(text);
    let now = time::now();

    let has_metadata = headings.iter().any(|h| h.metadata.is_some());
    let dialect = if has_metadata { Dialect::Native } else { hint };

    let Some(title) = headings.first() else {
        // No heading at all: file name is the title, the whole text is the
        // description.
        return Outline::from_parse(
            key.to_string(),
            outline_name_from_key(key),
            dialect,
            now,
            now,
            now,
            0,
            0,
            0,
            0,
            String::new(),
            text.to_string(),
            None,
            Vec::new(),
            digest,
        );
    };

    let preamble = text[..title.start].to_string();
    let title_raw = text[title.start..title.end].to_string();
    let description_end = headings.get(1).map(|h| h.start).unwrap_or(text.len());
    let description = text[title.end..description_end].to_string();

    let om = title.metadata.clone().unwrap_or_default();

    let base = headings.get(1).map(|h| h.level).unwrap_or(2);
    let mut notes: Vec<Note> = Vec::with_capacity(headings.len().saturating_sub(1));
    let mut prev_depth = 0usize;

    for (i, h) in headings.iter().enumerate().skip(1) {
        let raw_depth = h.level.saturating_sub(base) as usize;
        let depth = if notes.is_empty() {
            0
        } else {
            raw_depth.min(prev_depth + 1)
        };
        let body_end = headings.get(i + 1).map(|n| n.start).unwrap_or(text.len());
        let body = text[h.end..body_end].to_string();

        let m = h.metadata.clone().unwrap_or_default();
        let note_type = m
            .note_type
            .as_deref()
            .map(|k| ontology.find_or_create_type(k))
            .unwrap_or_else(|| ontology.default_note_type());
        let tags = m
            .tags
            .iter()
            .map(|t| ontology.find_or_create_tag(t))
            .collect();

        notes.push(Note::from_parse(
            h.text.clone(),
            depth,
            note_type,
            tags,
            m.reads.unwrap_or(0),
            m.revision.unwrap_or(0),
            m.created.unwrap_or(now),
            m.modified.unwrap_or(now),
            m.read.unwrap_or(now),
            m.progress.unwrap_or(0),
            m.importance.unwrap_or(0),
            m.urgency.unwrap_or(0),
            body,
            text[h.start..h.end].to_string(),
        ));
        prev_depth = depth;
    }

    Outline::from_parse(
        key.to_string(),
        title.text.clone(),
        dialect,
        om.created.unwrap_or(now),
        om.modified.unwrap_or(now),
        om.read.unwrap_or(now),
        om.reads.unwrap_or(0),
        om.revision.unwrap_or(0),
        om.importance.unwrap_or(0),
        om.urgency.unwrap_or(0),
        preamble,
        description,
        Some(title_raw),
        notes,
        digest,
    )
}

/// Load and parse one document. An unreadable file fails with an I/O error
/// scoped to this document only.
pub fn read_outline(
    fs: &dyn FileSystem,
    path: &Path,
    hint: Dialect,
    ontology: &Ontology,
) -> Result<Outline> {
    let text = fs
        .read_to_string(path)
        .map_err(|e| MnemoError::io(path, e))?;
    Ok(parse_outline(
        &text,
        &path.to_string_lossy(),
        hint,
        ontology,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, hint: Dialect) -> Outline {
        let ontology = Ontology::new();
        parse_outline(text, "/repo/memory/o.md", hint, &ontology)
    }

    #[test]
    fn test_parse_canonical_document() {
        let text = "# Test Outline\n\nOutline text.\n\n## Note 1\nNote 1 text.\n\n## Note 2\nNote 2 text.\n";
        let o = parse(text, Dialect::Markdown);

        assert_eq!(o.name(), "Test Outline");
        assert_eq!(o.notes_count(), 2);
        assert_eq!(o.notes()[0].name(), "Note 1");
        assert_eq!(o.notes()[1].name(), "Note 2");
        assert_eq!(o.notes()[0].depth(), 0);
        assert_eq!(o.notes()[1].depth(), 0);
        assert_eq!(o.description(), "\nOutline text.\n\n");
        assert_eq!(o.notes()[0].body(), "Note 1 text.\n\n");
    }

    #[test]
    fn test_first_note_level_establishes_depth_zero() {
        // Notes written at the title's own level: depth is relative to the
        // first note heading, not to a fixed level.
        let text = "# O\ntext\n\n# 1\nT1.\n\n# 3\nT3.\n\n## 33\nT33.\n\n### 333\nT333.\n";
        let o = parse(text, Dialect::Markdown);

        assert_eq!(o.notes_count(), 4);
        let depths: Vec<usize> = o.notes().iter().map(|n| n.depth()).collect();
        assert_eq!(depths, vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_upward_depth_jumps_are_capped() {
        let text = "# O\n\n## A\n\n##### X\n\n## B\n";
        let o = parse(text, Dialect::Markdown);

        let depths: Vec<usize> = o.notes().iter().map(|n| n.depth()).collect();
        // A at 0; X would be 3 levels deeper but a child may only be one
        // level deeper than its predecessor; B back at 0.
        assert_eq!(depths, vec![0, 1, 0]);
    }

    #[test]
    fn test_metadata_makes_document_native() {
        let text = "# O <!-- Metadata: type: Outline; reads: 3; -->\n\n\
                    ## A <!-- Metadata: type: Note; reads: 62; revision: 10; importance: 3/5; tags: cool,important; -->\nBody.\n";
        let o = parse(text, Dialect::Markdown);

        assert_eq!(o.dialect(), Dialect::Native, "metadata overrides the hint");
        assert_eq!(o.reads(), 3);
        let note = &o.notes()[0];
        assert_eq!(note.name(), "A");
        assert_eq!(note.reads(), 62);
        assert_eq!(note.revision(), 10);
        assert_eq!(note.importance(), 3);
        assert!(note.has_tag("cool"));
        assert!(note.has_tag("important"));
        assert_eq!(note.note_type().key(), "Note");
    }

    #[test]
    fn test_dialect_hint_decides_without_metadata() {
        let text = "# O\n\n## A\nBody.\n";
        assert_eq!(parse(text, Dialect::Native).dialect(), Dialect::Native);
        assert_eq!(parse(text, Dialect::Markdown).dialect(), Dialect::Markdown);
    }

    #[test]
    fn test_malformed_metadata_is_recovered_field_wise() {
        let text = "# O\n\n## A <!-- Metadata: type: Note; reads: lots; revision: 4; -->\nBody.\n";
        let o = parse(text, Dialect::Markdown);

        // the block still classifies the document
        assert_eq!(o.dialect(), Dialect::Native);
        let note = &o.notes()[0];
        assert_eq!(note.reads(), 0, "malformed counter treated as absent");
        assert_eq!(note.revision(), 4);
    }

    #[test]
    fn test_metadata_comment_is_not_part_of_the_name() {
        let text = "# O\n\n## Grow <!-- Metadata: type: Note; -->\nBody.\n";
        let o = parse(text, Dialect::Markdown);
        assert_eq!(o.notes()[0].name(), "Grow");
    }

    #[test]
    fn test_heading_in_code_fence_is_body_text() {
        let text = "# O\n\n## A\n```\n## not a heading\n```\n\n## B\n";
        let o = parse(text, Dialect::Markdown);

        assert_eq!(o.notes_count(), 2);
        assert!(o.notes()[0].body().contains("## not a heading"));
    }

    #[test]
    fn test_document_without_headings() {
        let o = parse("just some text\n", Dialect::Markdown);
        assert_eq!(o.name(), "o");
        assert_eq!(o.notes_count(), 0);
        assert_eq!(o.description(), "just some text\n");
    }

    #[test]
    fn test_preamble_before_title_is_kept() {
        let text = "stray line\n\n# O\n\n## A\n";
        let o = parse(text, Dialect::Markdown);
        assert_eq!(o.name(), "O");
        assert_eq!(o.notes_count(), 1);
    }

    #[test]
    fn test_inline_code_in_heading_name() {
        let text = "# O\n\n## Use `cargo` here\n";
        let o = parse(text, Dialect::Markdown);
        assert_eq!(o.notes()[0].name(), "Use `cargo` here");
    }
}
