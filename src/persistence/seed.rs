//! `PATH`-scan vocabulary seeding: when the vocabulary is empty, populate it
//! with executable names found on `$PATH` (or an override list) so the
//! synthesizer has something to draw from on a first run.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::core::vocab::Vocabulary;

/// Per-directory cap on entries scanned, so one enormous directory can't stall
/// startup or blow past any reasonable vocabulary size.
const MAX_ENTRIES_PER_DIR: usize = 256;
/// Per-directory scan timeout.
const SCAN_TIMEOUT: Duration = Duration::from_secs(2);

/// Used when neither an override nor `$PATH` itself is available, so a bare
/// environment still seeds something to search over.
const FALLBACK_PATH: &str = "/usr/bin:/bin:/usr/local/bin";

/// Counts from a completed seed pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeedReport {
    pub dirs_scanned: usize,
    pub words_added: usize,
}

/// Scans `override_path` (a colon-separated list, `$PATH`-style) if given,
/// otherwise the process's own `$PATH`, otherwise [`FALLBACK_PATH`], and
/// appends the basename of every regular, executable, non-symlink file found
/// to `vocab`.
///
/// Directories that don't exist or can't be read are skipped, not fatal.
pub fn seed(vocab: &mut Vocabulary, override_path: Option<&str>) -> SeedReport {
    let path_value = resolve_path_list(override_path, std::env::var("PATH").ok());

    let mut report = SeedReport::default();
    for dir in path_value.split(':').filter(|d| !d.is_empty()) {
        if scan_dir(Path::new(dir), vocab, &mut report).is_ok() {
            report.dirs_scanned += 1;
        }
    }

    report
}

/// Picks the colon-separated directory list to scan: `override_path` if given,
/// else `env_path` (the caller's `$PATH` lookup, already resolved so this stays
/// a pure function), else [`FALLBACK_PATH`].
fn resolve_path_list(override_path: Option<&str>, env_path: Option<String>) -> String {
    override_path
        .map(|p| p.to_string())
        .or(env_path)
        .unwrap_or_else(|| FALLBACK_PATH.to_string())
}

fn scan_dir(dir: &Path, vocab: &mut Vocabulary, report: &mut SeedReport) -> std::io::Result<()> {
    let entries = fs::read_dir(dir)?;
    let deadline = Instant::now() + SCAN_TIMEOUT;
    let mut seen = 0usize;

    for entry in entries {
        if seen >= MAX_ENTRIES_PER_DIR || Instant::now() >= deadline {
            break;
        }
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        seen += 1;

        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };
        if !file_type.is_file() {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if metadata.permissions().mode() & 0o111 == 0 {
            continue;
        }

        let name = entry.file_name();
        let name = match name.to_str() {
            Some(n) => n,
            None => continue,
        };
        if vocab.append(name).is_some() {
            report.words_added += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self as stdfs, File};
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    fn make_executable(path: &Path) {
        File::create(path).unwrap();
        let mut perms = stdfs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        stdfs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn seeds_executable_files_from_override_dir() {
        let dir = tempdir().unwrap();
        make_executable(&dir.path().join("grep"));
        make_executable(&dir.path().join("ls"));
        stdfs::write(dir.path().join("readme.txt"), b"not executable").unwrap();

        let mut vocab = Vocabulary::new();
        let report = seed(&mut vocab, Some(dir.path().to_str().unwrap()));

        assert_eq!(report.dirs_scanned, 1);
        assert_eq!(report.words_added, 2);
        assert!(vocab.find("grep").is_some());
        assert!(vocab.find("ls").is_some());
        assert!(vocab.find("readme.txt").is_none());
    }

    #[test]
    fn skips_symlinks_and_directories() {
        let dir = tempdir().unwrap();
        make_executable(&dir.path().join("real-bin"));
        symlink(dir.path().join("real-bin"), dir.path().join("linked-bin")).unwrap();
        stdfs::create_dir(dir.path().join("subdir")).unwrap();

        let mut vocab = Vocabulary::new();
        let report = seed(&mut vocab, Some(dir.path().to_str().unwrap()));

        assert_eq!(report.words_added, 1);
        assert!(vocab.find("real-bin").is_some());
        assert!(vocab.find("linked-bin").is_none());
        assert!(vocab.find("subdir").is_none());
    }

    #[test]
    fn missing_directory_in_path_is_skipped_not_fatal() {
        let mut vocab = Vocabulary::new();
        let report = seed(&mut vocab, Some("/definitely/not/a/real/path:/also/missing"));
        assert_eq!(report.dirs_scanned, 0);
        assert_eq!(report.words_added, 0);
    }

    #[test]
    fn caps_entries_per_directory() {
        let dir = tempdir().unwrap();
        for i in 0..(MAX_ENTRIES_PER_DIR + 20) {
            make_executable(&dir.path().join(format!("bin{i}")));
        }
        let mut vocab = Vocabulary::new();
        let report = seed(&mut vocab, Some(dir.path().to_str().unwrap()));
        assert!(report.words_added <= MAX_ENTRIES_PER_DIR);
    }

    #[test]
    fn falls_back_to_hardcoded_path_when_override_and_env_are_absent() {
        assert_eq!(resolve_path_list(None, None), FALLBACK_PATH);
    }

    #[test]
    fn prefers_override_over_env_path() {
        assert_eq!(
            resolve_path_list(Some("/override/bin"), Some("/env/bin".to_string())),
            "/override/bin"
        );
    }

    #[test]
    fn falls_back_to_env_path_when_no_override_is_given() {
        assert_eq!(resolve_path_list(None, Some("/env/bin".to_string())), "/env/bin");
    }
}
