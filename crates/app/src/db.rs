use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use services::{AppServices, Clock};

/// Open (and migrate) the database behind `raw`.
pub async fn open(raw: &str, seed: Option<u64>) -> Result<AppServices> {
    let url = normalize_sqlite_url(raw)?;
    prepare_parent_dir(&url)?;
    AppServices::new_sqlite(&url, Clock::System, seed)
        .await
        .with_context(|| format!("cannot open database {url}"))
}

/// Accept either a `sqlite:` URL or a bare file path.
///
/// Bare relative paths are resolved against the working directory.
pub fn normalize_sqlite_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("invalid --db value: {raw:?}");
    }
    if trimmed.starts_with("sqlite:") {
        return Ok(trimmed.to_string());
    }

    let path = Path::new(trimmed);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(format!("sqlite://{}", absolute.display()))
}

fn prepare_parent_dir(url: &str) -> Result<()> {
    let Some(path) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {url:?}");
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_pass_through() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:").unwrap(),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url(" sqlite:///tmp/q.db ").unwrap(),
            "sqlite:///tmp/q.db"
        );
    }

    #[test]
    fn bare_paths_become_absolute_urls() {
        assert_eq!(
            normalize_sqlite_url("/var/lib/quiz.db").unwrap(),
            "sqlite:///var/lib/quiz.db"
        );
        let relative = normalize_sqlite_url("quiz.db").unwrap();
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("quiz.db"));
    }

    #[test]
    fn blank_is_rejected() {
        assert!(normalize_sqlite_url("  ").is_err());
    }
}
