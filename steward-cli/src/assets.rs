//! Action-parameter sources: avatar image pools and profile text pools.
//!
//! Pools are loaded once before the run and cycled over the roster with
//! modulo indexing when they are smaller than it.

use account_client::{AvatarAsset, ProfileFields};
use anyhow::{Context, Result, bail};
use roster_engine::Rotation;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// Scan `dir` for avatar images and load them into memory. Files are
/// sorted by name so assignment is stable between runs.
pub fn load_avatars(dir: &Path) -> Result<Rotation<AvatarAsset>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("could not read avatar directory {}", dir.display()))?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    paths.sort();

    let mut assets = Vec::with_capacity(paths.len());
    for path in paths {
        let data = fs::read(&path)
            .with_context(|| format!("could not read avatar {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("avatar")
            .to_string();
        let content_type = AvatarAsset::content_type_for(&path);
        assets.push(AvatarAsset::new(name, content_type, data));
    }

    info!(count = assets.len(), dir = %dir.display(), "avatar pool loaded");
    Rotation::new(assets)
        .with_context(|| format!("no usable images in {}", dir.display()))
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Text pools for profile updates, each optional. An account's fields are
/// drawn from whichever pools exist; pools cycle independently.
pub struct ProfilePools {
    display_names: Option<Rotation<String>>,
    real_names: Option<Rotation<String>>,
    summaries: Option<Rotation<String>>,
}

impl ProfilePools {
    /// Load the three conventional files from `dir`. Missing files only
    /// drop their field; at least one pool must exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let display_names = load_line_pool(&dir.join("profile_names.txt"));
        let real_names = load_line_pool(&dir.join("real_names.txt"));
        let summaries = load_separated_pool(&dir.join("about_me.txt"));

        if display_names.is_none() && real_names.is_none() && summaries.is_none() {
            bail!(
                "no profile data in {} (expected profile_names.txt, real_names.txt or about_me.txt)",
                dir.display()
            );
        }
        Ok(Self {
            display_names,
            real_names,
            summaries,
        })
    }

    /// Fields for roster slot `index`.
    pub fn fields_for(&self, index: usize) -> ProfileFields {
        ProfileFields {
            display_name: self.display_names.as_ref().map(|p| p.get(index).clone()),
            real_name: self.real_names.as_ref().map(|p| p.get(index).clone()),
            summary: self.summaries.as_ref().map(|p| p.get(index).clone()),
        }
    }

    /// Whether any pool is smaller than `count` accounts and will repeat.
    pub fn wraps_for(&self, count: usize) -> bool {
        [&self.display_names, &self.real_names, &self.summaries]
            .into_iter()
            .flatten()
            .any(|pool| pool.wraps_for(count))
    }
}

/// One value per non-empty, non-comment line.
fn load_line_pool(path: &Path) -> Option<Rotation<String>> {
    let content = read_optional(path)?;
    let values: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect();
    Rotation::new(values)
}

/// Multi-line values separated by `---` lines.
fn load_separated_pool(path: &Path) -> Option<Rotation<String>> {
    let content = read_optional(path)?;
    let values: Vec<String> = content
        .split("---")
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.starts_with('#'))
        .map(str::to_string)
        .collect();
    Rotation::new(values)
}

fn read_optional(path: &Path) -> Option<String> {
    if !path.exists() {
        warn!(path = %path.display(), "profile data file not found, field skipped");
        return None;
    }
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable profile data file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &[u8]) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(content).unwrap();
    }

    #[test]
    fn avatar_scan_filters_extensions_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b.png", b"png-bytes");
        write_file(dir.path(), "a.JPG", b"jpg-bytes");
        write_file(dir.path(), "notes.txt", b"not an image");

        let pool = load_avatars(dir.path()).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(0).name, "a.JPG");
        assert_eq!(pool.get(0).content_type, "image/jpeg");
        assert_eq!(pool.get(1).name, "b.png");
        assert_eq!(pool.get(1).content_type, "image/png");
        assert_eq!(pool.get(1).data.as_ref(), b"png-bytes");
    }

    #[test]
    fn empty_avatar_directories_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "readme.md", b"no images");
        assert!(load_avatars(dir.path()).is_err());
        assert!(load_avatars(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn profile_pools_cycle_independently() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "profile_names.txt", b"Neo\nTrinity\n");
        write_file(
            dir.path(),
            "about_me.txt",
            b"first text\nspanning lines\n---\nsecond text\n---\n",
        );

        let pools = ProfilePools::load(dir.path()).unwrap();
        let first = pools.fields_for(0);
        assert_eq!(first.display_name.as_deref(), Some("Neo"));
        assert!(first.real_name.is_none(), "missing file drops the field");
        assert_eq!(first.summary.as_deref(), Some("first text\nspanning lines"));

        // Slot 2 wraps both two-entry pools.
        let third = pools.fields_for(2);
        assert_eq!(third.display_name.as_deref(), Some("Neo"));
        assert_eq!(third.summary.as_deref(), Some("first text\nspanning lines"));

        assert!(!pools.wraps_for(2));
        assert!(pools.wraps_for(3));
    }

    #[test]
    fn profile_data_must_exist_somewhere() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProfilePools::load(dir.path()).is_err());
    }
}
