//! Classification of raw job result bytes.
//!
//! A result is either a bare file or a zip container holding one or more
//! files. The classifier picks the target entry, decides text vs. binary
//! and resolves a filename for download.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{VaultError, VaultResult};

/// Leading bytes of a zip local file header.
pub const ZIP_SIGNATURE: [u8; 2] = [0x50, 0x4B];

const DEFAULT_TEXT_FILENAME: &str = "result.txt";
const DEFAULT_BINARY_FILENAME: &str = "result.bin";

/// Text or binary classification of a result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Binary,
}

impl ContentKind {
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Binary => "application/octet-stream",
        }
    }

    const fn default_filename(self) -> &'static str {
        match self {
            Self::Text => DEFAULT_TEXT_FILENAME,
            Self::Binary => DEFAULT_BINARY_FILENAME,
        }
    }
}

/// Raw result bytes plus how to read them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultBundle {
    pub bytes: Vec<u8>,
    /// `Some(true)` forces archive handling, `Some(false)` disables it,
    /// `None` sniffs the zip signature.
    pub container: Option<bool>,
    /// Path of the wanted entry inside the archive (also names the file).
    pub path_hint: Option<String>,
}

impl ResultBundle {
    pub fn new(bytes: Vec<u8>, path_hint: Option<&str>) -> Self {
        Self {
            bytes,
            container: None,
            path_hint: path_hint.map(str::to_string),
        }
    }

    fn is_container(&self) -> bool {
        self.container.unwrap_or_else(|| has_zip_signature(&self.bytes))
    }
}

/// Outcome of classifying a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedContent {
    pub kind: ContentKind,
    /// Decoded text, present for [`ContentKind::Text`].
    pub text: Option<String>,
    /// Filename to offer for download.
    pub filename: String,
    /// Full path of the archive entry that was opened, if any.
    pub entry_path: Option<String>,
    /// Bytes of the selected file (the entry content for archives).
    pub bytes: Vec<u8>,
}

impl ClassifiedContent {
    pub const fn mime(&self) -> &'static str {
        self.kind.mime()
    }

    /// Write the bytes into `dir` under the resolved filename.
    pub fn write_to(&self, dir: &Path) -> VaultResult<PathBuf> {
        let name = match self.filename.as_str() {
            "" | "." | ".." => self.kind.default_filename(),
            other => other,
        };
        std::fs::create_dir_all(dir)
            .map_err(|e| VaultError::Storage(format!("Failed to create {}: {e}", dir.display())))?;
        let path = dir.join(name);
        std::fs::write(&path, &self.bytes)
            .map_err(|e| VaultError::Storage(format!("Failed to write {}: {e}", path.display())))?;
        Ok(path)
    }
}

/// Whether `bytes` start like a zip archive.
pub fn has_zip_signature(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[..2] == ZIP_SIGNATURE
}

/// Strip leading slashes; an empty result means "no hint".
pub fn normalize_hint(hint: Option<&str>) -> Option<String> {
    let trimmed = hint?.trim().trim_start_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Pick the archive entry to read.
///
/// `entries` lists `(name, is_dir)` in archive order. Resolution order:
/// exact path match against the hint, then a filename-only match, then the
/// first non-directory entry.
pub fn select_entry(entries: &[(String, bool)], hint: Option<&str>) -> Option<usize> {
    let files = || entries.iter().enumerate().filter(|(_, (_, is_dir))| !is_dir);

    if let Some(hint) = normalize_hint(hint) {
        if let Some((idx, _)) = files().find(|(_, (name, _))| *name == hint) {
            return Some(idx);
        }
        let wanted = last_segment(&hint);
        if !wanted.is_empty() {
            if let Some((idx, _)) = files().find(|(_, (name, _))| last_segment(name) == wanted) {
                return Some(idx);
            }
        }
    }
    files().next().map(|(idx, _)| idx)
}

/// Whether every char of `text` is printable, common whitespace or extended Unicode.
pub fn is_text(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| {
            matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FFFD}')
                || c > '\u{FFFF}'
        })
}

/// Decode bytes and decide text vs. binary.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(bytes).ok()?;
    is_text(text).then(|| text.to_string())
}

fn open_entry(bytes: &[u8], hint: Option<&str>) -> VaultResult<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        entries.push((file.name().to_string(), file.is_dir()));
    }

    let idx = select_entry(&entries, hint)
        .ok_or_else(|| VaultError::Decode("archive contains no file entry".to_string()))?;

    let mut file = archive.by_index(idx)?;
    let name = file.name().to_string();
    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(|e| VaultError::Decode(format!("Failed to read entry {name}: {e}")))?;

    debug!(
        "Selected archive entry {} ({} bytes) out of {}",
        name,
        content.len(),
        entries.len()
    );
    Ok((name, content))
}

/// Classify a result bundle.
///
/// Fails with [`VaultError::Decode`] when the container cannot be opened or
/// holds no file entry.
pub fn classify(bundle: &ResultBundle) -> VaultResult<ClassifiedContent> {
    let hint = bundle.path_hint.as_deref();
    let (entry_path, bytes) = if bundle.is_container() {
        let (name, content) = open_entry(&bundle.bytes, hint)?;
        (Some(name), content)
    } else {
        (None, bundle.bytes.clone())
    };

    let text = decode_text(&bytes);
    let kind = if text.is_some() {
        ContentKind::Text
    } else {
        ContentKind::Binary
    };

    let filename = entry_path
        .as_deref()
        .map(last_segment)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            normalize_hint(hint)
                .map(|h| last_segment(&h).to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| kind.default_filename().to_string());

    Ok(ClassifiedContent {
        kind,
        text,
        filename,
        entry_path,
        bytes,
    })
}
