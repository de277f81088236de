//! Patch layers, in the order they are applied.

use std::fmt;

/// A named set of files applied over a game install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Mandatory base game version (1.13c).
    BaseVersion,
    /// Mandatory ladder distribution.
    Core,
    /// Optional maphack.
    Maphack,
    /// Optional HD mod.
    Hd,
}

impl Layer {
    /// Every layer in application order.
    pub const ALL: [Layer; 4] = [Layer::BaseVersion, Layer::Core, Layer::Maphack, Layer::Hd];

    /// Layers the user can switch off.
    pub const OPTIONAL: [Layer; 2] = [Layer::Maphack, Layer::Hd];

    /// Remote directory holding the layer's files and manifest.
    pub fn remote_dir(&self) -> &'static str {
        match self {
            Layer::BaseVersion => "1.13c",
            Layer::Core => "current",
            Layer::Maphack => "maphack",
            Layer::Hd => "hd",
        }
    }

    /// Remote path of the layer's manifest.
    pub fn manifest_path(&self) -> String {
        format!("{}/manifest.json", self.remote_dir())
    }

    /// Remote path of one of the layer's files.
    pub fn remote_path(&self, name: &str) -> String {
        format!("{}/{}", self.remote_dir(), name)
    }

    /// Returns true if the layer can be disabled.
    pub fn is_optional(&self) -> bool {
        matches!(self, Layer::Maphack | Layer::Hd)
    }

    /// File whose presence on disk means the layer is installed.
    pub fn marker_file(&self) -> Option<&'static str> {
        match self {
            Layer::Maphack => Some("BH.dll"),
            Layer::Hd => Some("D2HD.dll"),
            Layer::BaseVersion | Layer::Core => None,
        }
    }

    /// Status message shown before diffing the layer.
    pub fn checking_message(&self) -> &'static str {
        match self {
            Layer::BaseVersion => "Checking game version...",
            Layer::Core => "Checking Slashdiablo patch...",
            Layer::Maphack => "Checking maphack...",
            Layer::Hd => "Checking HD mod...",
        }
    }

    /// Human readable name of the version the layer brings an install to.
    pub fn target(&self) -> &'static str {
        match self {
            Layer::BaseVersion => "1.13c",
            Layer::Core => "current Slashdiablo patch",
            Layer::Maphack => "latest maphack version",
            Layer::Hd => "latest HD mod version",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::BaseVersion => write!(f, "1.13c"),
            Layer::Core => write!(f, "slashdiablo"),
            Layer::Maphack => write!(f, "maphack"),
            Layer::Hd => write!(f, "hd"),
        }
    }
}
