use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `~/.sift`
pub fn sift_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".sift"))
}

pub fn ensure_sift_home() -> Result<PathBuf> {
    let dir = sift_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Relative paths in the config are taken from `home`.
pub fn resolve_in(home: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() { p.to_path_buf() } else { home.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_land_in_home() {
        let home = Path::new("/home/u/.sift");
        assert_eq!(resolve_in(home, "todos.json"), home.join("todos.json"));
        assert_eq!(resolve_in(home, "/data/t.json"), PathBuf::from("/data/t.json"));
    }
}
