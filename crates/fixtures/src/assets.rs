//! Image assets paired with fixture records

use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{FixtureError, FixtureResult};

/// An image file whose stem doubles as an entity identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub path: PathBuf,
    pub stem: String,
}

/// Sorted image files of one directory
#[derive(Debug, Clone)]
pub struct ImageAssets {
    dir: PathBuf,
    assets: Vec<ImageAsset>,
}

impl ImageAssets {
    /// Collect the image files directly inside `dir`, sorted by file name.
    ///
    /// A missing directory yields an empty set; pairing then reports the
    /// shortfall.
    pub fn scan(dir: &Path) -> FixtureResult<Self> {
        let mut assets = Vec::new();

        if dir.is_dir() {
            for entry in WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let path = entry.path();
                if ImageFormat::from_path(path).is_err() {
                    debug!("Skipping non-image asset {}", path.display());
                    continue;
                }
                if let Some(stem) = path.file_stem() {
                    assets.push(ImageAsset {
                        path: path.to_path_buf(),
                        stem: stem.to_string_lossy().to_string(),
                    });
                }
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            assets,
        })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageAsset> {
        self.assets.iter()
    }

    /// Pair record *i* with asset *i*. Extra assets are ignored.
    pub fn pair_with<T>(&self, records: Vec<T>) -> FixtureResult<Vec<(T, ImageAsset)>> {
        if self.assets.len() < records.len() {
            return Err(FixtureError::InsufficientAssets {
                needed: records.len(),
                found: self.assets.len(),
                dir: self.dir.clone(),
            });
        }

        Ok(records
            .into_iter()
            .zip(self.assets.iter().cloned())
            .collect())
    }
}
