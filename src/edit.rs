use crate::buffer::{LineBuffer, Position};
use crate::rewrite::ProposedEdit;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// A verified byte-span replacement in one file.
///
/// Proposals are expressed in line/column positions against a buffer
/// snapshot; an `Edit` pins them to byte offsets and remembers what the
/// span held, so a file changed since the snapshot is never clobbered.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until applied"]
pub struct Edit {
    pub file: PathBuf,
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    pub new_text: String,
    pub expected_before: EditVerification,
}

/// What the span must contain before the edit may be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text, used for long statements
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Exact match up to 1 KiB, hash beyond.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Before-text verification failed at {file}:{byte_start}")]
    BeforeTextMismatch {
        file: PathBuf,
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("Invalid byte range: [{byte_start}, {byte_end}) in file of length {file_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        file_len: usize,
    },

    #[error("Overlapping edits in {file} at bytes {byte_start}..{byte_end}")]
    Overlapping {
        file: PathBuf,
        byte_start: usize,
        byte_end: usize,
    },

    #[error("Position {line}:{column} does not exist in {file}")]
    PositionOutOfBounds {
        file: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 validation error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result of applying an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for success/already-applied"]
pub enum EditResult {
    Applied { file: PathBuf, bytes_changed: usize },
    /// The span already holds the new text
    AlreadyApplied { file: PathBuf },
}

impl Edit {
    pub fn new(
        file: impl Into<PathBuf>,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: impl Into<String>,
    ) -> Self {
        let expected = expected_before.into();
        Self {
            file: file.into(),
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(&expected),
        }
    }

    /// Pin a proposal made against `buffer` to the bytes of `file`.
    pub fn from_proposal(
        file: impl Into<PathBuf>,
        buffer: &LineBuffer,
        proposal: &ProposedEdit,
    ) -> Result<Self, EditError> {
        let file = file.into();
        let offset = |position: Position| {
            buffer
                .offset_of(position)
                .ok_or_else(|| EditError::PositionOutOfBounds {
                    file: file.clone(),
                    line: position.line,
                    column: position.column,
                })
        };
        let byte_start = offset(proposal.range.start)?;
        let byte_end = offset(proposal.range.end)?;
        if byte_start > byte_end {
            return Err(EditError::InvalidByteRange {
                byte_start,
                byte_end,
                file_len: buffer.source().len(),
            });
        }

        let before = &buffer.source()[byte_start..byte_end];
        Ok(Self::new(
            file,
            byte_start,
            byte_end,
            proposal.replacement.clone(),
            before,
        ))
    }

    /// Check the span against `content`, returning its current text.
    fn validate<'a>(&self, content: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                file_len: content.len(),
            });
        }

        let current = content
            .get(self.byte_start..self.byte_end)
            .ok_or(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                file_len: content.len(),
            })?;

        if current != self.new_text && !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                file: self.file.clone(),
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(current)
    }

    /// Apply this edit to its file atomically.
    pub fn apply(&self) -> Result<EditResult, EditError> {
        let mut results = apply_file_edits(&self.file, std::slice::from_ref(self))?;
        Ok(results.remove(0))
    }

    /// Apply edits across any number of files.
    ///
    /// Each file is rewritten once, atomically, with all of its edits. A
    /// failing edit leaves its whole file untouched. Results follow the
    /// order of `edits`.
    pub fn apply_batch(edits: &[Edit]) -> Result<Vec<EditResult>, EditError> {
        let mut files: Vec<&Path> = edits.iter().map(|e| e.file.as_path()).collect();
        files.sort();
        files.dedup();

        let mut results: Vec<Option<EditResult>> = vec![None; edits.len()];
        for file in files {
            let (indices, file_edits): (Vec<usize>, Vec<Edit>) = edits
                .iter()
                .enumerate()
                .filter(|(_, e)| e.file == file)
                .map(|(idx, e)| (idx, e.clone()))
                .unzip();

            for (idx, result) in indices.into_iter().zip(apply_file_edits(file, &file_edits)?) {
                results[idx] = Some(result);
            }
        }

        Ok(results.into_iter().flatten().collect())
    }
}

/// Apply `edits` to `source` in memory.
///
/// Edits must not overlap. Results follow the order of `edits`.
pub fn apply_to_source(
    source: &str,
    edits: &[Edit],
) -> Result<(String, Vec<EditResult>), EditError> {
    let mut order: Vec<usize> = (0..edits.len()).collect();
    order.sort_by(|&a, &b| edits[b].byte_start.cmp(&edits[a].byte_start));

    for &idx in &order {
        edits[idx].validate(source)?;
    }

    // Sorted descending: each edit must end before the previous one starts
    for pair in order.windows(2) {
        let (later, earlier) = (&edits[pair[0]], &edits[pair[1]]);
        if earlier.byte_end > later.byte_start {
            return Err(EditError::Overlapping {
                file: later.file.clone(),
                byte_start: later.byte_start,
                byte_end: earlier.byte_end,
            });
        }
    }

    let mut output = source.to_string();
    let mut results: Vec<Option<EditResult>> = vec![None; edits.len()];

    for &idx in &order {
        let edit = &edits[idx];
        let result = if &source[edit.byte_start..edit.byte_end] == edit.new_text {
            EditResult::AlreadyApplied {
                file: edit.file.clone(),
            }
        } else {
            output.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
            EditResult::Applied {
                file: edit.file.clone(),
                bytes_changed: edit.new_text.len(),
            }
        };
        results[idx] = Some(result);
    }

    Ok((output, results.into_iter().flatten().collect()))
}

fn apply_file_edits(file: &Path, edits: &[Edit]) -> Result<Vec<EditResult>, EditError> {
    let bytes = fs::read(file)?;
    let original = std::str::from_utf8(&bytes)?;

    let (updated, results) = apply_to_source(original, edits)?;
    if updated != original {
        atomic_write(file, updated.as_bytes())?;
        filetime::set_file_mtime(file, filetime::FileTime::now())?;
    }

    Ok(results)
}

/// Atomic file write: tempfile in the same directory, fsync, rename.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(EditError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            )))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
