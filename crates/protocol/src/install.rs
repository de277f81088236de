//! Configured game installs.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layer::Layer;

/// Maphack configuration file a user may keep out of patching.
pub const MAPHACK_CONFIG: &str = "BH.cfg";

/// A game install as stored by the configuration collaborator.
///
/// The core only reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInstall {
    pub id: String,
    pub location: PathBuf,
    /// Number of instances that should be running.
    #[serde(default = "default_instances")]
    pub instances: u32,
    /// Extra command line flags for the game process.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(default)]
    pub maphack: bool,
    /// Keep the user's own maphack config.
    #[serde(default)]
    pub override_bh_cfg: bool,
    #[serde(default)]
    pub hd: bool,
}

fn default_instances() -> u32 {
    1
}

impl GameInstall {
    /// Creates an install with one instance and no optional layers.
    pub fn new(id: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            instances: default_instances(),
            flags: Vec::new(),
            maphack: false,
            override_bh_cfg: false,
            hd: false,
        }
    }

    /// Returns true if `layer` should be present on disk.
    ///
    /// Mandatory layers are always enabled.
    pub fn layer_enabled(&self, layer: Layer) -> bool {
        match layer {
            Layer::BaseVersion | Layer::Core => true,
            Layer::Maphack => self.maphack,
            Layer::Hd => self.hd,
        }
    }

    /// Files of `layer` that must be neither patched nor removed.
    pub fn ignored_files(&self, layer: Layer) -> Vec<String> {
        match layer {
            Layer::Maphack if self.override_bh_cfg => vec![MAPHACK_CONFIG.to_string()],
            _ => Vec::new(),
        }
    }
}

/// A manifest name that would resolve outside the install directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid file name {name:?}: {reason}")]
pub struct UnsafeName {
    pub name: String,
    pub reason: &'static str,
}

/// Checks that a manifest name stays inside whatever directory it is joined to.
///
/// Rejects:
/// - Empty names
/// - Absolute names (`/x`, `\x`)
/// - Parent directory traversal (`..`)
/// - Drive or UNC prefixes (`C:`, `\\server`)
///
/// Both `/` and `\` count as separators so the result does not depend on the
/// host OS.
pub fn validate_name(name: &str) -> Result<(), UnsafeName> {
    let reject = |reason| {
        Err(UnsafeName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("empty name");
    }
    if name.starts_with(['/', '\\']) {
        return reject("absolute path not allowed");
    }

    let mut normal = 0;
    for part in name.split(['/', '\\']) {
        if part.contains(':') {
            return reject("path prefix not allowed");
        }
        for component in Path::new(part).components() {
            match component {
                Component::ParentDir => return reject("parent directory traversal not allowed"),
                Component::Prefix(_) => return reject("path prefix not allowed"),
                Component::RootDir => return reject("absolute path not allowed"),
                Component::CurDir => {}
                Component::Normal(_) => normal += 1,
            }
        }
    }
    if normal == 0 {
        return reject("no file component");
    }

    Ok(())
}

/// Maps a `/` separated manifest name onto `dir`, component by component.
///
/// Fails for any name [`validate_name`] rejects, so the result is always
/// below `dir`.
pub fn localize_path(dir: &Path, name: &str) -> Result<PathBuf, UnsafeName> {
    validate_name(name)?;
    Ok(name
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .fold(dir.to_path_buf(), |path, part| path.join(part)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandatory_layers_always_enabled() {
        let install = GameInstall::new("g1", "/games/d2");
        assert!(install.layer_enabled(Layer::BaseVersion));
        assert!(install.layer_enabled(Layer::Core));
        assert!(!install.layer_enabled(Layer::Maphack));
        assert!(!install.layer_enabled(Layer::Hd));
    }

    #[test]
    fn override_only_affects_maphack() {
        let install = GameInstall {
            maphack: true,
            override_bh_cfg: true,
            ..GameInstall::new("g1", "/games/d2")
        };
        assert_eq!(install.ignored_files(Layer::Maphack), vec!["BH.cfg"]);
        assert!(install.ignored_files(Layer::Hd).is_empty());
        assert!(install.ignored_files(Layer::Core).is_empty());

        let plain = GameInstall::new("g2", "/games/d2");
        assert!(plain.ignored_files(Layer::Maphack).is_empty());
    }

    #[test]
    fn localize_nested_name() {
        let path = localize_path(Path::new("/games/d2"), "data/global/excel/x.txt").unwrap();
        assert_eq!(
            path,
            Path::new("/games/d2")
                .join("data")
                .join("global")
                .join("excel")
                .join("x.txt")
        );
    }

    #[test]
    fn localize_backslash_and_redundant_separators() {
        let path = localize_path(Path::new("/games/d2"), "data\\\\global/./x.txt").unwrap();
        assert_eq!(
            path,
            Path::new("/games/d2").join("data").join("global").join("x.txt")
        );
    }

    #[test]
    fn rejects_empty_name() {
        assert!(validate_name("").is_err());
        assert!(validate_name("./").is_err());
    }

    #[test]
    fn rejects_parent_dir_traversal() {
        assert!(validate_name("../escaped.txt").is_err());
        assert!(validate_name("data/../../escaped.txt").is_err());
        assert!(validate_name("data\\..\\..\\escaped.txt").is_err());
    }

    #[test]
    fn rejects_absolute_names() {
        assert!(validate_name("/Patch_D2.mpq").is_err());
        assert!(validate_name("\\Patch_D2.mpq").is_err());
        assert!(validate_name("\\\\server\\share\\x.dll").is_err());
    }

    #[test]
    fn rejects_drive_prefixes() {
        assert!(validate_name("C:/Windows/evil.dll").is_err());
        assert!(validate_name("C:evil.dll").is_err());
        assert!(validate_name("data/C:x").is_err());
    }

    #[test]
    fn accepts_plain_relative_names() {
        assert!(validate_name("Patch_D2.mpq").is_ok());
        assert!(validate_name("data/global/excel/x.txt").is_ok());
        assert!(validate_name("BH..cfg").is_ok());
    }

    #[test]
    fn localize_reports_rejected_name() {
        let err = localize_path(Path::new("/games/d2"), "../victim.txt").unwrap_err();
        assert_eq!(err.name, "../victim.txt");
        assert!(err.to_string().contains("parent directory traversal"));
    }

    #[test]
    fn deserialize_with_defaults() {
        let json = r#"{"id":"g1","location":"/games/d2"}"#;
        let install: GameInstall = serde_json::from_str(json).unwrap();
        assert_eq!(install, GameInstall::new("g1", "/games/d2"));
    }
}
