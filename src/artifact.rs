//! Binary persistence of the three artifacts (corpus, partition, model).
//!
//! Every artifact is a CBOR envelope `{magic, kind, version, payload}`.
//! Payload maps are key-sorted before they get here, so equal values encode
//! to identical bytes. Decoding checks the envelope, rejects trailing bytes,
//! and runs the payload's own invariant checks before handing it out.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{ClassifierError, Result};

pub const MAGIC: &str = "taxonomy-classifier";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    BowCorpus,
    CategoryPartition,
    ClassifierModel,
}

/// A value that can be persisted as an artifact
pub trait Artifact: Serialize + DeserializeOwned {
    const KIND: ArtifactKind;

    /// invariant checks run after decoding
    fn validate(&self) -> std::result::Result<(), String>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    magic: &'a str,
    kind: ArtifactKind,
    version: u32,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    magic: String,
    kind: ArtifactKind,
    version: u32,
    payload: T,
}

pub fn to_bytes<T: Artifact>(value: &T) -> Result<Vec<u8>> {
    let envelope = EnvelopeRef {
        magic: MAGIC,
        kind: T::KIND,
        version: FORMAT_VERSION,
        payload: value,
    };
    serde_cbor::to_vec(&envelope).map_err(|e| ClassifierError::serialization(e.to_string()))
}

pub fn from_bytes<T: Artifact>(bytes: &[u8]) -> Result<T> {
    // ヘッダだけ先に見る (payload の型違いより分かりやすいエラーにするため)
    let header: Envelope<IgnoredAny> = serde_cbor::from_slice(bytes)
        .map_err(|e| ClassifierError::deserialization(format!("not a readable artifact: {e}")))?;
    if header.magic != MAGIC {
        return Err(ClassifierError::deserialization(format!("unknown magic `{}`", header.magic)));
    }
    if header.kind != T::KIND {
        return Err(ClassifierError::deserialization(format!(
            "expected a {:?} artifact, found {:?}",
            T::KIND,
            header.kind
        )));
    }
    if header.version != FORMAT_VERSION {
        return Err(ClassifierError::deserialization(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            header.version
        )));
    }
    let envelope: Envelope<T> = serde_cbor::from_slice(bytes)
        .map_err(|e| ClassifierError::deserialization(format!("{:?} payload: {e}", T::KIND)))?;
    envelope
        .payload
        .validate()
        .map_err(|e| ClassifierError::deserialization(format!("{:?} payload: {e}", T::KIND)))?;
    Ok(envelope.payload)
}

pub fn write<T: Artifact, W: Write>(value: &T, sink: &mut W) -> Result<()> {
    let bytes = to_bytes(value)?;
    sink.write_all(&bytes)
        .and_then(|_| sink.flush())
        .map_err(|e| ClassifierError::io(format!("writing {:?} artifact", T::KIND), e))
}

/// Reads the source to its end; nothing is returned unless the whole
/// artifact decodes and validates.
pub fn read<T: Artifact, R: Read>(source: &mut R) -> Result<T> {
    let mut bytes = Vec::new();
    source
        .read_to_end(&mut bytes)
        .map_err(|e| ClassifierError::io(format!("reading {:?} artifact", T::KIND), e))?;
    from_bytes(&bytes)
}

/// An encoded artifact written to a temp file next to its target, not yet
/// visible under the target name. Dropping it removes the temp file.
#[derive(Debug)]
pub struct StagedArtifact {
    file: NamedTempFile,
    target: PathBuf,
    kind: ArtifactKind,
    bytes: usize,
}

impl StagedArtifact {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the temp file over the target
    pub fn commit(self) -> Result<()> {
        let Self { file, target, kind, bytes } = self;
        if let Err(e) = file.persist(&target) {
            warn!(path = %target.display(), error = %e.error, "artifact rename failed");
            return Err(ClassifierError::io(format!("writing {}", target.display()), e.error));
        }
        debug!(path = %target.display(), kind = ?kind, bytes, "artifact saved");
        Ok(())
    }
}

/// Encode `value` into a fresh temp file in the directory of `path`.
/// Nothing at `path` changes until `commit`.
pub fn stage<T: Artifact>(value: &T, path: &Path) -> Result<StagedArtifact> {
    let bytes = to_bytes(value)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let written = (|| -> std::io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&bytes)?;
        file.flush()?;
        file.as_file().sync_all()?;
        Ok(file)
    })();
    match written {
        Ok(file) => Ok(StagedArtifact { file, target: path.to_path_buf(), kind: T::KIND, bytes: bytes.len() }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "artifact write failed");
            Err(ClassifierError::io(format!("writing {}", path.display()), e))
        }
    }
}

/// Stage and commit in one go.
/// A failure leaves whatever was at `path` before untouched.
pub fn save<T: Artifact>(value: &T, path: &Path) -> Result<()> {
    stage(value, path)?.commit()
}

pub fn load<T: Artifact>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| ClassifierError::io(format!("reading {}", path.display()), e))?;
    let value = from_bytes(&bytes)?;
    debug!(path = %path.display(), kind = ?T::KIND, bytes = bytes.len(), "artifact loaded");
    Ok(value)
}
