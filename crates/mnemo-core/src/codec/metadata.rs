use chrono::NaiveDateTime;

use crate::utils::time;

/// Heading metadata carried in a trailing HTML comment:
///
/// `<!-- Metadata: type: Note; created: 2018-02-04 09:47:13; reads: 62;
/// read: 2018-03-03 21:50:50; revision: 10; modified: 2018-03-03 21:50:50;
/// importance: 3/5; urgency: 2/5; progress: 20%; tags: cool,important; -->`
///
/// Parsing is tolerant: unknown keys are ignored, malformed values are
/// treated as absent fields and never fail the document.
#[derive(Debug, Default, Clone)]
pub(crate) struct MetadataBlock {
    pub note_type: Option<String>,
    pub created: Option<NaiveDateTime>,
    pub read: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub reads: Option<u32>,
    pub revision: Option<u32>,
    pub importance: Option<u8>,
    pub urgency: Option<u8>,
    pub progress: Option<u8>,
    pub tags: Vec<String>,
}

const OPEN: &str = "<!--";
const CLOSE: &str = "-->";
const MARKER: &str = "Metadata:";

impl MetadataBlock {
    /// Whether an inline HTML fragment looks like a metadata comment.
    pub fn is_metadata_comment(html: &str) -> bool {
        let html = html.trim();
        html.starts_with(OPEN) && html.contains(MARKER)
    }

    /// Parse a metadata comment. Returns None when the fragment is not a
    /// metadata comment at all; partial/garbled pairs inside one are
    /// skipped field-wise.
    pub fn parse(html: &str) -> Option<Self> {
        let html = html.trim();
        if !Self::is_metadata_comment(html) {
            return None;
        }

        let inner = html
            .trim_start_matches(OPEN)
            .trim_end_matches(CLOSE)
            .trim();
        let payload = &inner[inner.find(MARKER)? + MARKER.len()..];

        let mut block = MetadataBlock::default();
        for pair in payload.split(';') {
            let Some((key, value)) = pair.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "type" if !value.is_empty() => block.note_type = Some(value.to_string()),
                "created" => block.created = time::parse_timestamp(value),
                "read" => block.read = time::parse_timestamp(value),
                "modified" => block.modified = time::parse_timestamp(value),
                "reads" => block.reads = value.parse().ok(),
                "revision" => block.revision = value.parse().ok(),
                "importance" => block.importance = parse_scale(value),
                "urgency" => block.urgency = parse_scale(value),
                "progress" => block.progress = parse_progress(value),
                "tags" => {
                    block.tags = value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => {}
            }
        }
        Some(block)
    }

    /// Render the canonical comment form. `progress` and `tags` are only
    /// emitted when meaningful.
    pub fn render(&self) -> String {
        let mut out = String::from(OPEN);
        out.push(' ');
        out.push_str(MARKER);

        if let Some(t) = &self.note_type {
            push_pair(&mut out, "type", t);
        }
        if let Some(ts) = &self.created {
            push_pair(&mut out, "created", &time::format_timestamp(ts));
        }
        if let Some(reads) = self.reads {
            push_pair(&mut out, "reads", &reads.to_string());
        }
        if let Some(ts) = &self.read {
            push_pair(&mut out, "read", &time::format_timestamp(ts));
        }
        if let Some(revision) = self.revision {
            push_pair(&mut out, "revision", &revision.to_string());
        }
        if let Some(ts) = &self.modified {
            push_pair(&mut out, "modified", &time::format_timestamp(ts));
        }
        if let Some(importance) = self.importance {
            push_pair(&mut out, "importance", &format!("{}/5", importance));
        }
        if let Some(urgency) = self.urgency {
            push_pair(&mut out, "urgency", &format!("{}/5", urgency));
        }
        if let Some(progress) = self.progress.filter(|p| *p > 0) {
            push_pair(&mut out, "progress", &format!("{}%", progress));
        }
        if !self.tags.is_empty() {
            push_pair(&mut out, "tags", &self.tags.join(","));
        }

        out.push(' ');
        out.push_str(CLOSE);
        out
    }
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push(';');
}

/// `N/5` or bare `N`.
fn parse_scale(value: &str) -> Option<u8> {
    let number = value.split('/').next()?.trim();
    number.parse().ok()
}

/// `N%` or bare `N`.
fn parse_progress(value: &str) -> Option<u8> {
    value.trim_end_matches('%').trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_block() {
        let html = "<!-- Metadata: type: Note; created: 2018-02-04 09:47:13; reads: 62; \
                    read: 2018-03-03 21:50:50; revision: 10; modified: 2018-03-03 21:50:50; \
                    importance: 3/5; urgency: 2/5; progress: 20%; tags: cool,important; -->";
        let block = MetadataBlock::parse(html).unwrap();
        assert_eq!(block.note_type.as_deref(), Some("Note"));
        assert_eq!(block.reads, Some(62));
        assert_eq!(block.revision, Some(10));
        assert_eq!(block.importance, Some(3));
        assert_eq!(block.urgency, Some(2));
        assert_eq!(block.progress, Some(20));
        assert_eq!(block.tags, vec!["cool", "important"]);
        assert_eq!(
            time::format_timestamp(&block.created.unwrap()),
            "2018-02-04 09:47:13"
        );
    }

    #[test]
    fn test_parse_is_tolerant_to_garbled_pairs() {
        let html = "<!-- Metadata: type: Note; created: tomorrow; reads: many; \
                    revision: 2; nonsense; importance: high/5; -->";
        let block = MetadataBlock::parse(html).unwrap();
        assert_eq!(block.note_type.as_deref(), Some("Note"));
        assert_eq!(block.created, None, "malformed timestamp becomes absent");
        assert_eq!(block.reads, None, "malformed counter becomes absent");
        assert_eq!(block.revision, Some(2), "good pairs around bad ones survive");
        assert_eq!(block.importance, None);
    }

    #[test]
    fn test_non_metadata_comment_is_rejected() {
        assert!(MetadataBlock::parse("<!-- just a comment -->").is_none());
        assert!(MetadataBlock::parse("not html at all").is_none());
    }

    #[test]
    fn test_render_round_trip() {
        let block = MetadataBlock {
            note_type: Some("Action".to_string()),
            created: time::parse_timestamp("2018-02-04 09:47:13"),
            read: time::parse_timestamp("2018-03-03 21:50:50"),
            modified: time::parse_timestamp("2018-03-03 21:50:50"),
            reads: Some(5),
            revision: Some(3),
            importance: Some(1),
            urgency: Some(4),
            progress: Some(20),
            tags: vec!["todo".to_string()],
        };
        let rendered = block.render();
        let back = MetadataBlock::parse(&rendered).unwrap();
        assert_eq!(back.note_type.as_deref(), Some("Action"));
        assert_eq!(back.reads, Some(5));
        assert_eq!(back.revision, Some(3));
        assert_eq!(back.importance, Some(1));
        assert_eq!(back.urgency, Some(4));
        assert_eq!(back.progress, Some(20));
        assert_eq!(back.tags, vec!["todo"]);
    }

    #[test]
    fn test_render_omits_zero_progress_and_empty_tags() {
        let block = MetadataBlock {
            note_type: Some("Note".to_string()),
            progress: Some(0),
            ..Default::default()
        };
        let rendered = block.render();
        assert!(!rendered.contains("progress"));
        assert!(!rendered.contains("tags"));
    }
}
