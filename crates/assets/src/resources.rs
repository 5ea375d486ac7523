use crate::AssetError;
use crate::manifest::{AssetKind, AssetManifest, AssetSource};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

/// Content-addressed id computed from an asset's loaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(head))
    }
}

/// Decoded RGBA8 texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// A single-color texture.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }
}

/// A loaded asset.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Texture(TextureData),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Ready { id: AssetId, resource: Resource },
    Failed(String),
}

/// Loading progress: finished (ready or failed) out of total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub finished: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.finished >= self.total
    }
}

/// The set of resources named by a manifest, loaded incrementally.
///
/// Nothing blocks on the set as a whole: each frame calls [`ResourceSet::poll`],
/// which loads at most `load_budget` entries, and consumers ask for individual
/// resources that may or may not be ready yet. A failed load is logged and
/// recorded; it never aborts the frame.
#[derive(Debug)]
pub struct ResourceSet {
    root: PathBuf,
    slots: BTreeMap<String, Slot>,
    queue: VecDeque<AssetSource>,
    load_budget: usize,
}

impl ResourceSet {
    /// Default number of entries loaded per poll.
    pub const DEFAULT_LOAD_BUDGET: usize = 1;

    pub fn new(manifest: AssetManifest, root: impl Into<PathBuf>) -> Self {
        let mut slots = BTreeMap::new();
        let mut queue = VecDeque::new();
        for source in manifest.assets {
            slots.insert(source.name.clone(), Slot::Pending);
            queue.push_back(source);
        }
        let root = root.into();
        tracing::debug!(root = %root.display(), pending = queue.len(), "resource set created");
        Self {
            root,
            slots,
            queue,
            load_budget: Self::DEFAULT_LOAD_BUDGET,
        }
    }

    /// An empty set with nothing to load.
    pub fn empty() -> Self {
        Self::new(AssetManifest::default(), PathBuf::new())
    }

    pub fn with_load_budget(mut self, budget: usize) -> Self {
        self.load_budget = budget.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load up to the per-poll budget. Returns how many entries finished.
    pub fn poll(&mut self) -> usize {
        let mut finished = 0;
        while finished < self.load_budget {
            let Some(source) = self.queue.pop_front() else {
                break;
            };
            let slot = match load_source(&self.root, &source) {
                Ok((id, resource)) => {
                    tracing::info!(name = %source.name, id = id.0, "asset loaded");
                    Slot::Ready { id, resource }
                }
                Err(e) => {
                    tracing::warn!(name = %source.name, path = %source.path, "asset failed to load: {e}");
                    Slot::Failed(e.to_string())
                }
            };
            self.slots.insert(source.name, slot);
            finished += 1;
        }
        if finished > 0 && self.queue.is_empty() {
            tracing::info!(total = self.slots.len(), "resource set finished loading");
        }
        finished
    }

    /// Drain the whole queue regardless of budget.
    pub fn load_all(&mut self) {
        while !self.queue.is_empty() {
            self.poll();
        }
    }

    /// True once every entry is ready or failed.
    pub fn is_ready(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            finished: self.slots.len() - self.queue.len(),
            total: self.slots.len(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        match self.slots.get(name) {
            Some(Slot::Ready { resource, .. }) => Some(resource),
            _ => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<&TextureData> {
        match self.get(name) {
            Some(Resource::Texture(t)) => Some(t),
            _ => None,
        }
    }

    /// Content id of a ready resource.
    pub fn asset_id(&self, name: &str) -> Option<AssetId> {
        match self.slots.get(name) {
            Some(Slot::Ready { id, .. }) => Some(*id),
            _ => None,
        }
    }

    /// Failure message for a resource that could not be loaded.
    pub fn failure(&self, name: &str) -> Option<&str> {
        match self.slots.get(name) {
            Some(Slot::Failed(msg)) => Some(msg),
            _ => None,
        }
    }

    /// Register an in-memory texture, replacing any pending load of that name.
    pub fn insert_texture(&mut self, name: impl Into<String>, texture: TextureData) -> AssetId {
        let name = name.into();
        self.queue.retain(|s| s.name != name);
        let id = AssetId::of(&texture.rgba);
        self.slots.insert(
            name,
            Slot::Ready {
                id,
                resource: Resource::Texture(texture),
            },
        );
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn load_source(root: &Path, source: &AssetSource) -> Result<(AssetId, Resource), AssetError> {
    let path = root.join(&source.path);
    let bytes = std::fs::read(&path)?;
    let id = AssetId::of(&bytes);
    let resource = match source.kind {
        AssetKind::Texture => {
            let image = image::load_from_memory(&bytes)
                .map_err(|e| AssetError::Decode {
                    name: source.name.clone(),
                    reason: e.to_string(),
                })?
                .to_rgba8();
            Resource::Texture(TextureData {
                width: image.width(),
                height: image.height(),
                rgba: image.into_raw(),
            })
        }
        AssetKind::Binary => Resource::Binary(bytes),
    };
    Ok((id, resource))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str) {
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        img.save(dir.join(name)).unwrap();
    }

    fn manifest(entries: &[(&str, AssetKind, &str)]) -> AssetManifest {
        AssetManifest {
            assets: entries
                .iter()
                .map(|(name, kind, path)| AssetSource {
                    name: (*name).into(),
                    kind: *kind,
                    path: (*path).into(),
                })
                .collect(),
        }
    }

    #[test]
    fn nothing_is_loaded_before_poll() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "bg.png");
        let set = ResourceSet::new(manifest(&[("bg", AssetKind::Texture, "bg.png")]), dir.path());
        assert!(!set.is_ready());
        assert!(set.texture("bg").is_none());
        assert_eq!(set.progress(), Progress { finished: 0, total: 1 });
    }

    #[test]
    fn poll_decodes_textures() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "bg.png");
        let mut set =
            ResourceSet::new(manifest(&[("bg", AssetKind::Texture, "bg.png")]), dir.path());

        assert_eq!(set.poll(), 1);
        let tex = set.texture("bg").unwrap();
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(tex.rgba.len(), 4 * 2 * 4);
        assert_eq!(&tex.rgba[..4], &[10, 20, 30, 255]);
        assert!(set.asset_id("bg").is_some());
        assert!(set.is_ready());
    }

    #[test]
    fn poll_respects_budget() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), b"a").unwrap();
        std::fs::write(dir.path().join("b.bin"), b"b").unwrap();
        std::fs::write(dir.path().join("c.bin"), b"c").unwrap();
        let mut set = ResourceSet::new(
            manifest(&[
                ("a", AssetKind::Binary, "a.bin"),
                ("b", AssetKind::Binary, "b.bin"),
                ("c", AssetKind::Binary, "c.bin"),
            ]),
            dir.path(),
        )
        .with_load_budget(2);

        assert_eq!(set.poll(), 2);
        assert_eq!(set.progress().finished, 2);
        assert_eq!(set.poll(), 1);
        assert!(set.progress().is_complete());
        assert_eq!(set.poll(), 0);
        assert_eq!(set.get("c"), Some(&Resource::Binary(b"c".to_vec())));
    }

    #[test]
    fn missing_file_is_recorded_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = ResourceSet::new(
            manifest(&[("bg", AssetKind::Texture, "missing.jpg")]),
            dir.path(),
        );
        set.load_all();
        assert!(set.is_ready());
        assert!(set.texture("bg").is_none());
        assert!(set.failure("bg").is_some());
    }

    #[test]
    fn undecodable_texture_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not an image").unwrap();
        let mut set =
            ResourceSet::new(manifest(&[("bad", AssetKind::Texture, "bad.png")]), dir.path());
        set.load_all();
        assert!(set.failure("bad").unwrap().contains("bad"));
    }

    #[test]
    fn content_ids_are_deterministic() {
        assert_eq!(AssetId::of(b"stars"), AssetId::of(b"stars"));
        assert_ne!(AssetId::of(b"stars"), AssetId::of(b"dust"));
    }

    #[test]
    fn inserted_texture_replaces_pending_load() {
        let mut set = ResourceSet::new(
            manifest(&[("bg", AssetKind::Texture, "never-read.jpg")]),
            PathBuf::from("/nonexistent"),
        );
        set.insert_texture("bg", TextureData::solid([0, 0, 0, 255]));
        assert!(set.is_ready());
        assert_eq!(set.texture("bg").unwrap().width, 1);
    }
}
