//! Pre-flight checks run before the bot starts.
//!
//! Order matters: the env file is ensured first, then loaded, then the
//! required variables are checked, then the working directories created.

use std::{fs, path::Path};

use crate::{errors::Error, Result};

/// Variables that must be non-empty for the bot to start.
pub const REQUIRED_VARS: [&str; 4] = ["API_ID", "API_HASH", "BOT_TOKEN", "BIN_CHANNEL"];

/// Directories the bot writes into, relative to the working directory.
pub const WORK_DIRS: [&str; 3] = ["data", "static", "plugins"];

pub const ENV_FILE: &str = ".env";
pub const ENV_EXAMPLE_FILE: &str = ".env.example";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvFile {
    /// `.env` already exists.
    Present,
    /// `.env` was missing and has just been copied from `.env.example`.
    CreatedFromExample,
    /// Neither `.env` nor `.env.example` exist.
    Missing,
}

/// Outcome of [`preflight`]. Only `Ready` lets startup continue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Preflight {
    Ready,
    /// `.env` was just copied from the example and still needs credentials.
    EnvCreated,
    /// Neither `.env` nor `.env.example` exist.
    EnvMissing,
    /// Required variables that are unset or blank after loading `.env`.
    MissingVars(Vec<&'static str>),
}

/// Run the startup checks in order, stopping at the first one that fails:
/// ensure `.env`, load it, check the required variables, create the
/// working directories. `lookup` is read after `.env` has been loaded.
pub fn preflight(root: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Preflight> {
    match ensure_env_file(root)? {
        EnvFile::Present => {}
        EnvFile::CreatedFromExample => return Ok(Preflight::EnvCreated),
        EnvFile::Missing => return Ok(Preflight::EnvMissing),
    }

    load_env_file(root)?;

    let missing = missing_required(lookup);
    if !missing.is_empty() {
        return Ok(Preflight::MissingVars(missing));
    }

    ensure_dirs(root)?;
    Ok(Preflight::Ready)
}

pub fn ensure_env_file(root: &Path) -> Result<EnvFile> {
    let env_path = root.join(ENV_FILE);
    if env_path.exists() {
        return Ok(EnvFile::Present);
    }

    let example = root.join(ENV_EXAMPLE_FILE);
    if !example.exists() {
        return Ok(EnvFile::Missing);
    }

    fs::copy(&example, &env_path)?;
    Ok(EnvFile::CreatedFromExample)
}

/// Load `root/.env` into the process environment without overriding
/// variables that are already set.
pub fn load_env_file(root: &Path) -> Result<()> {
    match dotenvy::from_path(root.join(ENV_FILE)) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(Error::Config(format!("failed to read {ENV_FILE}: {e}"))),
    }
}

/// Names from [`REQUIRED_VARS`] that are unset or blank.
pub fn missing_required(lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
    REQUIRED_VARS
        .into_iter()
        .filter(|key| lookup(key).map(|v| v.trim().is_empty()).unwrap_or(true))
        .collect()
}

pub fn ensure_dirs(root: &Path) -> Result<()> {
    for dir in WORK_DIRS {
        fs::create_dir_all(root.join(dir))?;
    }
    Ok(())
}

/// Fail when `found` is older than `minimum`. Both are dotted versions; a
/// leading `v` and any suffix after the numeric part (`-nightly`, ` (abc)`)
/// are ignored.
pub fn check_min_version(found: &str, minimum: &str) -> Result<()> {
    let have = parse_version(found)
        .ok_or_else(|| Error::Config(format!("unrecognised version string: {found:?}")))?;
    let need = parse_version(minimum)
        .ok_or_else(|| Error::Config(format!("unrecognised version string: {minimum:?}")))?;

    if have < need {
        return Err(Error::Config(format!(
            "version {found} is too old; {minimum} or newer is required"
        )));
    }
    Ok(())
}

fn parse_version(s: &str) -> Option<[u32; 3]> {
    let s = s.trim().trim_start_matches('v');
    let numeric: &str = s
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .next()
        .unwrap_or("");

    let mut out = [0u32; 3];
    let mut seen = 0;
    for (i, part) in numeric.split('.').filter(|p| !p.is_empty()).take(3).enumerate() {
        out[i] = part.parse().ok()?;
        seen += 1;
    }
    if seen == 0 {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    fn all_required() -> HashMap<&'static str, String> {
        REQUIRED_VARS.iter().map(|k| (*k, "1".to_string())).collect()
    }

    #[test]
    fn version_below_minimum_is_rejected() {
        assert!(check_min_version("3.9.18", "3.10").is_err());
        assert!(check_min_version("1.79.0", "1.80").is_err());
    }

    #[test]
    fn version_at_or_above_minimum_passes() {
        assert!(check_min_version("3.10.0", "3.10").is_ok());
        assert!(check_min_version("3.12.1", "3.10").is_ok());
        assert!(check_min_version("1.82.0 (f6e511eec 2024-10-15)", "1.80").is_ok());
        assert!(check_min_version("v1.85.0-nightly", "1.80.0").is_ok());
    }

    #[test]
    fn garbage_version_is_an_error() {
        assert!(check_min_version("unknown", "1.80").is_err());
    }

    #[test]
    fn existing_env_file_is_left_alone() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(ENV_FILE), "BOT_TOKEN=x\n").unwrap();
        fs::write(root.path().join(ENV_EXAMPLE_FILE), "BOT_TOKEN=\n").unwrap();

        assert_eq!(ensure_env_file(root.path()).unwrap(), EnvFile::Present);
        assert_eq!(fs::read_to_string(root.path().join(ENV_FILE)).unwrap(), "BOT_TOKEN=x\n");
    }

    #[test]
    fn created_env_stops_before_anything_else() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(ENV_EXAMPLE_FILE), "API_ID=\n").unwrap();

        let env = all_required();
        let out = preflight(root.path(), |k| env.get(k).cloned()).unwrap();
        assert_eq!(out, Preflight::EnvCreated);
        assert_eq!(fs::read_to_string(root.path().join(ENV_FILE)).unwrap(), "API_ID=\n");
        for dir in WORK_DIRS {
            assert!(!root.path().join(dir).exists());
        }
    }

    #[test]
    fn no_env_and_no_example_stops_startup() {
        let root = tempfile::tempdir().unwrap();
        let env = all_required();
        let out = preflight(root.path(), |k| env.get(k).cloned()).unwrap();
        assert_eq!(out, Preflight::EnvMissing);
        assert!(!root.path().join(ENV_FILE).exists());
        assert!(!root.path().join("data").exists());
    }

    #[test]
    fn missing_vars_stop_before_dirs_are_created() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(ENV_FILE), "FSB_PREFLIGHT_MARKER=1\n").unwrap();

        let env = vars(&[("API_ID", "1"), ("BOT_TOKEN", " ")]);
        let out = preflight(root.path(), |k| env.get(k).cloned()).unwrap();
        assert_eq!(out, Preflight::MissingVars(vec!["API_HASH", "BOT_TOKEN", "BIN_CHANNEL"]));
        assert!(!root.path().join("data").exists());
    }

    #[test]
    fn complete_setup_is_ready_and_creates_dirs() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(ENV_FILE), "FSB_PREFLIGHT_MARKER=1\n").unwrap();

        let env = all_required();
        let out = preflight(root.path(), |k| env.get(k).cloned()).unwrap();
        assert_eq!(out, Preflight::Ready);
        for dir in WORK_DIRS {
            assert!(root.path().join(dir).is_dir());
        }
        // idempotent
        assert_eq!(preflight(root.path(), |k| env.get(k).cloned()).unwrap(), Preflight::Ready);
    }

    #[test]
    fn each_blank_or_unset_var_is_reported() {
        for skip in REQUIRED_VARS {
            let mut env = all_required();
            env.insert(skip, "   ".to_string());
            assert_eq!(missing_required(|k| env.get(k).cloned()), vec![skip]);

            env.remove(skip);
            assert_eq!(missing_required(|k| env.get(k).cloned()), vec![skip]);
        }
    }

    #[test]
    fn load_env_file_tolerates_missing_file() {
        let root = tempfile::tempdir().unwrap();
        assert!(load_env_file(root.path()).is_ok());
    }
}
