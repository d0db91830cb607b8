use std::path::PathBuf;

/// What a stencil is a template for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilKind {
    Note,
    Outline,
}

/// A template document used to seed newly inserted content.
///
/// Stencils are collected by the repository scan from `stencils/notes` and
/// `stencils/outlines` and are read-only at the point of use.
#[derive(Debug, Clone)]
pub struct Stencil {
    kind: StencilKind,
    name: String,
    path: PathBuf,
    content: String,
}

impl Stencil {
    pub fn new(kind: StencilKind, name: String, path: PathBuf, content: String) -> Self {
        Self {
            kind,
            name,
            path,
            content,
        }
    }

    pub fn kind(&self) -> StencilKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Full template text, headings included.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Template text with the leading heading line stripped — what seeds a
    /// new note's body. Stencils without a heading seed verbatim.
    pub fn body(&self) -> &str {
        let trimmed_start = self.content.trim_start_matches('\n');
        if trimmed_start.starts_with('#') {
            match trimmed_start.find('\n') {
                Some(pos) => &trimmed_start[pos + 1..],
                None => "",
            }
        } else {
            &self.content
        }
    }
}
