//! Remote manifest format and fetcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::io::AsyncReadExt;

use crate::install::validate_name;
use crate::layer::Layer;
use crate::remote::{FetchError, RemoteSource};

/// A file that belongs to a patch layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchFile {
    /// Relative path under the install directory, `/` separated.
    ///
    /// Names that could leave the install directory fail to decode.
    #[serde(deserialize_with = "relative_name")]
    pub name: String,
    /// CRC-32 computed by the distribution server, transported as hex.
    #[serde(with = "crc_hex")]
    pub crc: u32,
    pub last_modified: DateTime<Utc>,
    pub content_length: i64,
}

/// The authoritative file listing of one layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub files: Vec<PatchFile>,
}

impl Manifest {
    /// Decodes a manifest from its JSON representation.
    pub fn from_slice(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Total declared size of every file in the manifest.
    pub fn total_bytes(&self) -> i64 {
        self.files.iter().map(|f| f.content_length).sum()
    }
}

/// Errors produced while retrieving a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: FetchError,
    },

    #[error("read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Fetches and decodes the manifest of `layer` from the remote source.
pub async fn fetch_manifest(
    source: &dyn RemoteSource,
    layer: Layer,
) -> Result<Manifest, ManifestError> {
    let path = layer.manifest_path();

    let mut body = source
        .fetch(&path)
        .await
        .map_err(|source| ManifestError::Fetch {
            path: path.clone(),
            source,
        })?;

    let mut data = Vec::new();
    body.read_to_end(&mut data)
        .await
        .map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;

    let manifest = Manifest::from_slice(&data).map_err(|source| ManifestError::Decode {
        path: path.clone(),
        source,
    })?;

    tracing::debug!(%layer, files = manifest.files.len(), "manifest fetched");
    Ok(manifest)
}

fn relative_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let name = String::deserialize(deserializer)?;
    validate_name(&name).map_err(serde::de::Error::custom)?;
    Ok(name)
}

/// Serde adapter for checksums transported as hex strings.
mod crc_hex {
    use super::*;

    pub fn serialize<S: Serializer>(crc: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{crc:08x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid crc: {raw:?}")))
    }

    pub(super) fn parse(raw: &str) -> Option<u32> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > 8 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok()
    }
}
