use crate::AssetError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How an asset's bytes are interpreted once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    /// Decoded to RGBA8 pixels.
    Texture,
    /// Kept as raw bytes.
    Binary,
}

/// One entry of the manifest: a name consumers look up, and a path relative
/// to the resource root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSource {
    pub name: String,
    pub kind: AssetKind,
    pub path: String,
}

impl AssetSource {
    pub fn texture(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AssetKind::Texture,
            path: path.into(),
        }
    }
}

/// Static list of assets the experience needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub assets: Vec<AssetSource>,
}

impl AssetManifest {
    /// Equirectangular background wrapped around the scene.
    pub const SPACE_BACKGROUND: &'static str = "spaceBackground";

    /// The manifest shipped with the application.
    pub fn builtin() -> Self {
        Self {
            assets: vec![AssetSource::texture(
                Self::SPACE_BACKGROUND,
                "space-background.jpg",
            )],
        }
    }

    pub fn get(&self, name: &str) -> Option<&AssetSource> {
        self.assets.iter().find(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Save the manifest as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lists_space_background() {
        let manifest = AssetManifest::builtin();
        let source = manifest.get(AssetManifest::SPACE_BACKGROUND).unwrap();
        assert_eq!(source.kind, AssetKind::Texture);
        assert!(source.path.ends_with(".jpg"));
    }

    #[test]
    fn parses_camel_case_kinds() {
        let manifest = AssetManifest::from_json(
            r#"{ "assets": [ { "name": "noise", "kind": "binary", "path": "noise.bin" } ] }"#,
        )
        .unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.assets[0].kind, AssetKind::Binary);
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let manifest = AssetManifest::builtin();
        manifest.save(tmp.path()).unwrap();

        let loaded = AssetManifest::load(tmp.path()).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            AssetManifest::from_json("{ not json"),
            Err(AssetError::Json(_))
        ));
    }
}
