use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Context;

/// Uses `input` when set, otherwise a sqlite file under `data_dir`. For
/// sqlite DSNs the parent directory and file are created up front.
pub(crate) fn resolve_dsn(input: &str, data_dir: &str) -> anyhow::Result<String> {
    if !input.trim().is_empty() {
        ensure_sqlite_dsn(input)?;
        return Ok(input.to_string());
    }

    let db_path = PathBuf::from(data_dir).join("db").join("chatgate.db");
    let db_path = db_path.to_string_lossy();
    let dsn = match db_path.strip_prefix('/') {
        Some(trimmed) => format!("sqlite:///{trimmed}?mode=rwc"),
        None => format!("sqlite://{db_path}?mode=rwc"),
    };
    ensure_sqlite_dsn(&dsn)?;
    Ok(dsn)
}

fn ensure_sqlite_dsn(dsn: &str) -> anyhow::Result<()> {
    let Some(rest) = dsn.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    if rest.starts_with(":memory:") || rest.starts_with("memory:") {
        return Ok(());
    }
    let path_part = rest.split('?').next().unwrap_or("");
    if path_part.is_empty() {
        return Ok(());
    }

    let path = PathBuf::from(path_part);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create sqlite parent dir {}", parent.display()))?;
    }
    if !path.exists() {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("create sqlite file {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dsn_lives_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let dsn = resolve_dsn("", &data_dir).unwrap();
        assert!(dsn.starts_with("sqlite:///"));
        assert!(dsn.ends_with("/db/chatgate.db?mode=rwc"));
        assert!(dir.path().join("db").join("chatgate.db").exists());
    }

    #[test]
    fn explicit_dsn_is_kept() {
        assert_eq!(resolve_dsn("sqlite::memory:", "./unused").unwrap(), "sqlite::memory:");
        assert_eq!(
            resolve_dsn("postgres://db/audit", "./unused").unwrap(),
            "postgres://db/audit"
        );
    }
}
