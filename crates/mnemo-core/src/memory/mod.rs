use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::codec;
use crate::config::MnemoConfig;
use crate::error::{MnemoError, Result};
use crate::model::Dialect;
use crate::note::Note;
use crate::ontology::{NoteType, Ontology, Tag};
use crate::outline::Outline;
use crate::repository::{AccessMode, Repository, MEMORY_DIR};
use crate::stencil::{Stencil, StencilKind};
use crate::vfs::{FileSystem, PhysicalFileSystem};

mod scan;

pub use scan::ScanTask;


/// Statistics of the last repository scan.
#[derive(Debug, Default, Clone)]
pub struct ScanStats {
    pub total_files: usize,
    pub parsed: usize,
    pub failed: usize,
    pub stencils: usize,
}

/// The collection of all outlines of one repository.
///
/// `Memory` owns every `Outline` exclusively; nothing is shared by
/// identity between collections. Mutations on one outline are synchronous
/// and single-writer; two different outlines may be edited concurrently
/// from different threads — the only state they share is the `Ontology`,
/// whose registries are safe for concurrent find-or-create.
pub struct Memory {
    repository: Repository,
    fs: Arc<dyn FileSystem>,
    ontology: Arc<Ontology>,
    outlines: BTreeMap<String, Outline>,
    note_stencils: Vec<Stencil>,
    outline_stencils: Vec<Stencil>,
    stats: ScanStats,
}

impl Memory {
    /// Scan the repository and parse every document, synchronously.
    ///
    /// One unreadable document is logged and skipped; it never aborts the
    /// whole scan.
    pub fn learn(repository: Repository) -> Result<Memory> {
        Self::learn_with(repository, Arc::new(PhysicalFileSystem))
    }

    /// Classify and learn the repository a configuration points at.
    pub fn learn_from_config(config: &MnemoConfig) -> Result<Memory> {
        let fs: Arc<dyn FileSystem> = Arc::new(PhysicalFileSystem);
        let mut repository = Repository::classify(&*fs, &config.repository.path)?;
        repository.set_read_only(config.repository.read_only);
        Self::learn_with(repository, fs)
    }

    pub fn learn_with(repository: Repository, fs: Arc<dyn FileSystem>) -> Result<Memory> {
        let ontology = Arc::new(Ontology::new());
        let scan = repository.scan(&*fs);
        let hint = repository.parse_hint();

        let mut stats = ScanStats {
            total_files: scan.outline_files.len(),
            ..Default::default()
        };

        let mut outlines = BTreeMap::new();
        for path in &scan.outline_files {
            match codec::read_outline(&*fs, path, hint, ontology.as_ref()) {
                Ok(outline) => {
                    stats.parsed += 1;
                    outlines.insert(outline.key().to_string(), outline);
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!("skipping unreadable document: {}", e);
                }
            }
        }

        let note_stencils = load_stencils(&*fs, StencilKind::Note, &scan.note_stencil_files);
        let outline_stencils =
            load_stencils(&*fs, StencilKind::Outline, &scan.outline_stencil_files);
        stats.stencils = note_stencils.len() + outline_stencils.len();

        info!(
            "learned {} of {} documents ({} failed, {} stencils)",
            stats.parsed, stats.total_files, stats.failed, stats.stencils
        );

        Ok(Memory {
            repository,
            fs,
            ontology,
            outlines,
            note_stencils,
            outline_stencils,
            stats,
        })
    }

    // --- queries ---------------------------------------------------------

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn ontology(&self) -> &Arc<Ontology> {
        &self.ontology
    }

    pub fn scan_stats(&self) -> &ScanStats {
        &self.stats
    }

    /// All outlines, ordered by key.
    pub fn outlines(&self) -> Vec<&Outline> {
        self.outlines.values().collect()
    }

    pub fn outlines_count(&self) -> usize {
        self.outlines.len()
    }

    /// Total note count across all outlines.
    pub fn notes_count(&self) -> usize {
        self.outlines.values().map(Outline::notes_count).sum()
    }

    pub fn get_outline(&self, key: &str) -> Option<&Outline> {
        self.outlines.get(key)
    }

    pub fn get_outline_mut(&mut self, key: &str) -> Option<&mut Outline> {
        self.outlines.get_mut(key)
    }

    /// Read-only stencil access, as used by note/outline creation.
    pub fn get_stencils(&self, kind: StencilKind) -> &[Stencil] {
        match kind {
            StencilKind::Note => &self.note_stencils,
            StencilKind::Outline => &self.outline_stencils,
        }
    }

    // --- document lifecycle ----------------------------------------------

    /// Create a new outline backed by `file_name` in the repository's
    /// document directory. A stencil, when given, seeds the whole
    /// document; the title is set to `name` either way.
    pub fn outline_new(
        &mut self,
        file_name: &str,
        name: &str,
        stencil: Option<&Stencil>,
    ) -> Result<&Outline> {
        if self.repository.access() == AccessMode::SingleFile {
            return Err(MnemoError::InvalidOperation(
                "a single-file repository holds exactly one document".to_string(),
            ));
        }

        let dir = match self.repository.parse_hint() {
            Dialect::Native => self.repository.root().join(MEMORY_DIR),
            Dialect::Markdown => self.repository.root().to_path_buf(),
        };
        let key = dir.join(file_name).to_string_lossy().to_string();
        if self.outlines.contains_key(&key) {
            return Err(MnemoError::InvalidOperation(format!(
                "outline '{}' already exists",
                key
            )));
        }

        let hint = self.repository.parse_hint();
        let mut outline = match stencil {
            Some(stencil) => {
                let mut o =
                    codec::parse_outline(stencil.content(), &key, hint, self.ontology.as_ref());
                o.set_name(name);
                o
            }
            None => Outline::new(key.clone(), name.to_string(), hint),
        };
        outline.mark_dirty();

        debug!("new outline '{}'", key);
        Ok(self.outlines.entry(key).or_insert(outline))
    }

    /// Drop an outline from the collection. The backing file is left on
    /// disk; forgetting is about the model, not the storage.
    pub fn outline_forget(&mut self, key: &str) -> Result<()> {
        self.outlines
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| MnemoError::InvalidOperation(format!("no outline '{}'", key)))
    }

    // --- note operations addressed by tree key ---------------------------

    /// Insert a freshly authored note into the outline with the given key.
    pub fn note_new(
        &mut self,
        outline_key: &str,
        offset: usize,
        name: &str,
        note_type: Arc<NoteType>,
        tags: Vec<Arc<Tag>>,
        stencil: Option<&Stencil>,
    ) -> Result<&Note> {
        let outline = self
            .outlines
            .get_mut(outline_key)
            .ok_or_else(|| MnemoError::InvalidOperation(format!("no outline '{}'", outline_key)))?;
        outline.insert_note(offset, name, note_type, tags, stencil)
    }

    /// Remove a note (and its subtree) from the outline with the given key.
    pub fn note_forget(&mut self, outline_key: &str, index: usize) -> Result<usize> {
        let outline = self
            .outlines
            .get_mut(outline_key)
            .ok_or_else(|| MnemoError::InvalidOperation(format!("no outline '{}'", outline_key)))?;
        outline.forget_note(index)
    }

    /// Move a note and its whole subtree from one outline to the end of
    /// another, preserving internal order and relative depths.
    ///
    /// Atomic from the caller's point of view: every precondition is
    /// checked before anything moves, so either the subtree fully lands in
    /// the target and is gone from the source, or neither tree changes.
    pub fn note_refactor(
        &mut self,
        source_key: &str,
        note_index: usize,
        target_key: &str,
    ) -> Result<()> {
        // Detach the target first; that also rules out source == target.
        let mut target = self.outlines.remove(target_key).ok_or_else(|| {
            MnemoError::InvalidOperation(format!("no target outline '{}'", target_key))
        })?;

        let source = match self.outlines.get_mut(source_key) {
            Some(source) if note_index < source.notes_count() => source,
            Some(_) => {
                self.outlines.insert(target_key.to_string(), target);
                return Err(MnemoError::InvalidOperation(format!(
                    "no note at index {} in '{}'",
                    note_index, source_key
                )));
            }
            None => {
                self.outlines.insert(target_key.to_string(), target);
                return Err(MnemoError::InvalidOperation(format!(
                    "no source outline '{}' (or source is the target)",
                    source_key
                )));
            }
        };

        let subtree = source.take_subtree(note_index);
        debug!(
            "refactoring {} notes from '{}' to '{}'",
            subtree.len(),
            source_key,
            target_key
        );
        target.append_subtree(subtree);
        self.outlines.insert(target_key.to_string(), target);
        Ok(())
    }

    // --- persistence ("remember") ----------------------------------------

    /// Serialize one outline and write it to its backing path. Returns
    /// false when the rendered text matches the bytes the document was
    /// loaded from, in which case nothing is written.
    pub fn remember(&mut self, key: &str) -> Result<bool> {
        if self.repository.is_read_only() {
            return Err(MnemoError::InvalidOperation(
                "repository is read-only".to_string(),
            ));
        }
        let outline = self
            .outlines
            .get_mut(key)
            .ok_or_else(|| MnemoError::InvalidOperation(format!("no outline '{}'", key)))?;

        let text = codec::render_outline(outline)?;
        let digest = codec::compute_digest(&text);
        if outline.source_digest() == Some(digest.as_str()) {
            debug!("'{}' unchanged, skipping write", key);
            return Ok(false);
        }

        let path = Path::new(key);
        self.fs
            .write_string(path, &text)
            .map_err(|e| MnemoError::io(path, e))?;
        outline.set_source_digest(digest);
        debug!("remembered '{}'", key);
        Ok(true)
    }

    /// Save every outline; returns how many files were actually written.
    pub fn remember_all(&mut self) -> Result<usize> {
        let keys: Vec<String> = self.outlines.keys().cloned().collect();
        let mut written = 0;
        for key in keys {
            if self.remember(&key)? {
                written += 1;
            }
        }
        Ok(written)
    }
}

fn load_stencils(
    fs: &dyn FileSystem,
    kind: StencilKind,
    files: &[std::path::PathBuf],
) -> Vec<Stencil> {
    let mut stencils = Vec::new();
    for path in files {
        match fs.read_to_string(path) {
            Ok(content) => {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                stencils.push(Stencil::new(kind, name, path.clone(), content));
            }
            Err(e) => warn!("skipping unreadable stencil {}: {}", path.display(), e),
        }
    }
    stencils
}
