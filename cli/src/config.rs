//! Persistent defaults for the intake CLI.
//!
//! Widget policy overrides live under `[limits]` in `~/.intake/config.toml`.
//! The file is read with `toml_edit` so rewrites keep the user's comments; a
//! file that no longer parses as TOML falls back to a line-oriented scan so a
//! stray edit can't wipe the settings, and writes go through a temp file
//! rename so a crash can't leave a half-written config behind.

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use tempfile::NamedTempFile;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;
use toml_edit::Table as TomlTable;
use toml_edit::value;

const LIMITS_TABLE: &str = "limits";
pub const KEY_MAX_PHOTOS: &str = "max_photos";
pub const KEY_MAX_TOTAL_BYTES: &str = "max_total_bytes";
pub const KEY_SETTLE_MS: &str = "settle_ms";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(home.join(".intake").join("config.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_photos(&self) -> anyhow::Result<Option<u64>> {
        self.read_limit(KEY_MAX_PHOTOS)
    }

    pub fn max_total_bytes(&self) -> anyhow::Result<Option<u64>> {
        self.read_limit(KEY_MAX_TOTAL_BYTES)
    }

    pub fn settle_ms(&self) -> anyhow::Result<Option<u64>> {
        self.read_limit(KEY_SETTLE_MS)
    }

    pub fn set_max_photos(&self, count: u64) -> anyhow::Result<()> {
        self.write_limit(KEY_MAX_PHOTOS, count)
    }

    pub fn set_max_total_bytes(&self, bytes: u64) -> anyhow::Result<()> {
        self.write_limit(KEY_MAX_TOTAL_BYTES, bytes)
    }

    pub fn set_settle_ms(&self, millis: u64) -> anyhow::Result<()> {
        self.write_limit(KEY_SETTLE_MS, millis)
    }

    fn read_limit(&self, key: &str) -> anyhow::Result<Option<u64>> {
        let Some(contents) = read_contents(&self.path)? else {
            return Ok(None);
        };

        let raw = match contents.parse::<DocumentMut>() {
            Ok(doc) => doc
                .get(LIMITS_TABLE)
                .and_then(TomlItem::as_table)
                .and_then(|limits| limits.get(key))
                .and_then(TomlItem::as_value)
                .and_then(|item| item.as_integer()),
            Err(_) => scan_limit_fallback(&contents, key),
        };

        Ok(raw.and_then(|raw| u64::try_from(raw).ok()))
    }

    fn write_limit(&self, key: &str, limit: u64) -> anyhow::Result<()> {
        let contents = read_contents(&self.path)?.unwrap_or_default();
        let limit = i64::try_from(limit).context("limit value out of range")?;

        let updated = match contents.parse::<DocumentMut>() {
            Ok(mut doc) => {
                let item = doc
                    .entry(LIMITS_TABLE)
                    .or_insert(TomlItem::Table(TomlTable::new()));
                if !item.is_table() {
                    *item = TomlItem::Table(TomlTable::new());
                }
                if let Some(limits) = item.as_table_mut() {
                    limits.set_implicit(false);
                    limits.insert(key, value(limit));
                }
                doc.to_string()
            }
            Err(_) => append_limit_fallback(&contents, key, limit),
        };

        write_atomic(&self.path, &updated)
    }
}

/// Last-wins scan of `[limits]` lines, for configs that no longer parse.
fn scan_limit_fallback(contents: &str, key: &str) -> Option<i64> {
    let mut in_limits = false;
    let mut found = None;

    for line in contents.lines() {
        let line = line
            .split_once('#')
            .map_or(line, |(head, _)| head)
            .trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('[') {
            in_limits = rest
                .split_once(']')
                .is_some_and(|(name, _)| name.trim() == LIMITS_TABLE);
            continue;
        }
        if !in_limits {
            continue;
        }
        let Some((candidate, raw)) = line.split_once('=') else {
            continue;
        };
        if candidate.trim() != key {
            continue;
        }
        if let Ok(parsed) = raw.trim().parse::<i64>() {
            found = Some(parsed);
        }
    }

    found
}

fn append_limit_fallback(existing: &str, key: &str, limit: i64) -> String {
    let mut out = existing.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&format!("[{LIMITS_TABLE}]\n{key} = {limit}\n"));
    out
}

fn read_contents(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}

fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let Some(parent) = path.parent() else {
        anyhow::bail!("invalid config path: {}", path.display());
    };
    std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent).context("create temp config file")?;
    use std::io::Write as _;
    tmp.write_all(contents.as_bytes())
        .context("write temp config file")?;
    tmp.flush().context("flush temp config file")?;
    tmp.persist(path).map_err(|err| {
        anyhow::Error::new(err.error).context(format!("persist config to {}", path.display()))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_reads_as_no_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path().join("config.toml"));
        assert_eq!(store.settle_ms().expect("read"), None);
        assert_eq!(store.max_photos().expect("read"), None);
    }

    #[test]
    fn set_then_get_round_trips_each_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path().join("config.toml"));

        store.set_settle_ms(500).expect("set settle");
        store.set_max_photos(6).expect("set photos");
        store.set_max_total_bytes(8 * 1024 * 1024).expect("set bytes");

        assert_eq!(store.settle_ms().expect("read"), Some(500));
        assert_eq!(store.max_photos().expect("read"), Some(6));
        assert_eq!(
            store.max_total_bytes().expect("read"),
            Some(8 * 1024 * 1024)
        );
    }

    #[test]
    fn rewrites_preserve_comments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "# intake settings\n\n[limits] # keep me\nsettle_ms = 350\n",
        )
        .expect("write config");

        let store = ConfigStore::new(path.clone());
        store.set_settle_ms(275).expect("set settle");

        let updated = std::fs::read_to_string(&path).expect("read updated");
        assert!(updated.contains("# intake settings"));
        assert!(updated.contains("# keep me"));
        assert!(updated.contains("settle_ms = 275"));
    }

    #[test]
    fn broken_toml_still_scans_limits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[broken\nkey = 1\n\n[limits]\nsettle_ms = 425 # keep me\n",
        )
        .expect("write config");

        let store = ConfigStore::new(path);
        assert_eq!(store.settle_ms().expect("read"), Some(425));
        assert_eq!(store.max_photos().expect("read"), None);
    }

    #[test]
    fn negative_values_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[limits]\nsettle_ms = -5\n").expect("write config");

        let store = ConfigStore::new(path);
        assert_eq!(store.settle_ms().expect("read"), None);
    }
}
