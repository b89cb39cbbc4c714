//! Build outputs.

use crate::error::{BuildError, Result};

/// The single packaged script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifact {
    pub file_name: String,
    pub code: String,
}

impl BundleArtifact {
    pub fn new(file_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            code: code.into(),
        }
    }

    pub fn byte_length(&self) -> u64 {
        self.code.len() as u64
    }

    /// blake3 hex digest of the code, stable across identical builds.
    pub fn content_hash(&self) -> String {
        blake3::hash(self.code.as_bytes()).to_hex().to_string()
    }
}

/// A non-script resource copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetArtifact {
    /// Path relative to the output directory, e.g. `assets/logo.png`.
    pub file_name: String,
    pub source: Vec<u8>,
}

impl AssetArtifact {
    pub fn byte_length(&self) -> u64 {
        self.source.len() as u64
    }
}

/// Kind of an artifact, as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Chunk,
    Asset,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Chunk => "chunk",
            ArtifactKind::Asset => "asset",
        }
    }
}

/// Exactly one script chunk plus its assets.
///
/// The only constructor enforces the single-chunk shape, so holding an
/// `ArtifactSet` is proof the embedding contract holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    chunk: BundleArtifact,
    assets: Vec<AssetArtifact>,
}

impl ArtifactSet {
    pub fn new(chunks: Vec<BundleArtifact>, assets: Vec<AssetArtifact>) -> Result<Self> {
        let mut chunks = chunks.into_iter();
        let (Some(chunk), None) = (chunks.next(), chunks.next()) else {
            return Err(BuildError::multi_chunk(
                "a build must produce exactly one script chunk",
            ));
        };

        let mut names = rustc_hash::FxHashSet::default();
        names.insert(chunk.file_name.as_str());
        for asset in &assets {
            if !names.insert(asset.file_name.as_str()) {
                return Err(BuildError::InvalidOutputPath(format!(
                    "two artifacts are named '{}'",
                    asset.file_name
                )));
            }
        }

        Ok(Self { chunk, assets })
    }

    pub fn chunk(&self) -> &BundleArtifact {
        &self.chunk
    }

    pub fn assets(&self) -> &[AssetArtifact] {
        &self.assets
    }

    /// `(name, bytes, kind)` for every artifact, chunk first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[u8], ArtifactKind)> {
        std::iter::once((
            self.chunk.file_name.as_str(),
            self.chunk.code.as_bytes(),
            ArtifactKind::Chunk,
        ))
        .chain(self.assets.iter().map(|asset| {
            (
                asset.file_name.as_str(),
                asset.source.as_slice(),
                ArtifactKind::Asset,
            )
        }))
    }

    pub fn total_bytes(&self) -> u64 {
        self.chunk.byte_length() + self.assets.iter().map(AssetArtifact::byte_length).sum::<u64>()
    }

    /// Replace the chunk's code, keeping its name and the assets.
    pub(crate) fn with_code(self, code: String) -> Self {
        Self {
            chunk: BundleArtifact {
                code,
                ..self.chunk
            },
            assets: self.assets,
        }
    }
}
