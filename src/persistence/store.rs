//! Load/save the vocabulary, association map, and observation log to a
//! plain-text encoding.
//!
//! Vocabulary: one token per line. Association: `i\tpi\tk\tpk\tvalue` per non-zero
//! entry. Observations: space-separated word indices terminated by a literal `-1`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::obs::ObservationLog;
use crate::core::vocab::Vocabulary;

/// Counts of lines skipped while loading, surfaced for logging rather than as an
/// error. Persistence I/O failures are warnings, not fatal.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadReport {
    pub vocab_words: usize,
    pub assoc_entries: usize,
    pub assoc_skipped: usize,
    pub obs_lines: usize,
}

/// Loads `vocab_path`/`assoc_path`/`obs_path` into fresh `Vocabulary` and
/// `ObservationLog` instances. A missing file is not an error for any of the
/// three; duplicate tokens in the vocabulary file deduplicate via
/// `Vocabulary::append`.
pub fn load(vocab_path: &Path, assoc_path: &Path, obs_path: &Path) -> (Vocabulary, ObservationLog, LoadReport) {
    let mut vocab = Vocabulary::new();
    let mut report = LoadReport::default();

    match fs::read_to_string(vocab_path) {
        Ok(contents) => {
            for line in contents.lines() {
                if vocab.append(line.trim()).is_some() {
                    report.vocab_words = vocab.num_words();
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %vocab_path.display(), error = %e, "failed to read vocabulary file"),
    }

    match fs::read_to_string(assoc_path) {
        Ok(contents) => {
            for line in contents.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                match parse_assoc_line(line, vocab.num_words()) {
                    Some((key, value)) => {
                        if vocab.assoc_mut().add(key, value).is_ok() {
                            report.assoc_entries += 1;
                        } else {
                            report.assoc_skipped += 1;
                        }
                    }
                    None => {
                        tracing::warn!(line, "skipping malformed association entry");
                        report.assoc_skipped += 1;
                    }
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %assoc_path.display(), error = %e, "failed to read association file"),
    }

    let mut obs = ObservationLog::new();
    match fs::read_to_string(obs_path) {
        Ok(contents) => {
            for line in contents.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(parsed) = parse_obs_line(line) {
                    obs.append(parsed);
                    report.obs_lines += 1;
                } else {
                    tracing::warn!(line, "skipping malformed observation line");
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %obs_path.display(), error = %e, "failed to read observation file"),
    }

    (vocab, obs, report)
}

fn parse_assoc_line(line: &str, num_words: usize) -> Option<(crate::core::assoc::Key, i64)> {
    let mut fields = line.split('\t');
    let i: u32 = fields.next()?.parse().ok()?;
    let pi: u8 = fields.next()?.parse().ok()?;
    let k: u32 = fields.next()?.parse().ok()?;
    let pk: u8 = fields.next()?.parse().ok()?;
    let value: i64 = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    if i as usize >= num_words || k as usize >= num_words {
        return None;
    }
    Some(((i, pi, k, pk), value))
}

fn parse_obs_line(line: &str) -> Option<Vec<u32>> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.last() != Some(&"-1") {
        return None;
    }
    tokens.pop();
    tokens.iter().map(|t| t.parse::<u32>().ok()).collect()
}

/// Writes `vocab`, its association map, and `obs` to the three paths, creating
/// parent directories as needed. Each file is written to a sibling temp file and
/// renamed into place, so a process kill mid-save cannot leave a torn file.
pub fn save(vocab: &Vocabulary, obs: &ObservationLog, vocab_path: &Path, assoc_path: &Path, obs_path: &Path) -> io::Result<()> {
    let vocab_text = vocab.words().join("\n");
    write_atomically(vocab_path, &vocab_text)?;

    let mut assoc_text = String::new();
    for ((i, pi, k, pk), value) in vocab.assoc().iter() {
        assoc_text.push_str(&format!("{i}\t{pi}\t{k}\t{pk}\t{value}\n"));
    }
    write_atomically(assoc_path, &assoc_text)?;

    let mut obs_text = String::new();
    for line in obs.iter() {
        for idx in line {
            obs_text.push_str(&idx.to_string());
            obs_text.push(' ');
        }
        obs_text.push_str("-1\n");
    }
    write_atomically(obs_path, &obs_text)?;

    Ok(())
}

fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = tmp_sibling(path);
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "shellgrok".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}
