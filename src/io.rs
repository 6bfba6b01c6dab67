//! Reading candidate strings for analysis: one per line, surrounding
//! whitespace trimmed, blank lines skipped.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;

/// Files at least this large are memory-mapped instead of read through a
/// buffered reader.
pub const DEFAULT_MMAP_THRESHOLD_BYTES: u64 = 16 * 1024 * 1024;

pub fn should_use_mmap(file_size_bytes: u64, threshold_bytes: u64) -> bool {
    file_size_bytes >= threshold_bytes
}

/// Read candidates from `path`, choosing mmap or buffered reads by size.
pub fn read_candidates<P: AsRef<Path>>(path: P, threshold_bytes: u64) -> Result<Vec<String>> {
    let path = path.as_ref();
    let meta = std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    let candidates = if meta.is_file() && should_use_mmap(meta.len(), threshold_bytes) {
        read_candidates_mmap(path)?
    } else {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        read_candidates_from(BufReader::new(file))
            .with_context(|| format!("read {}", path.display()))?
    };
    log::info!("loaded {} candidates from {}", candidates.len(), path.display());
    Ok(candidates)
}

/// Read candidates from any buffered source, e.g. locked stdin.
pub fn read_candidates_from<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for line in reader.lines() {
        push_candidate(&mut out, &line?);
    }
    Ok(out)
}

fn read_candidates_mmap(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    // The file is only read, and only for the lifetime of this call.
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", path.display()))?;
    log::debug!("memory-mapped {} ({} bytes)", path.display(), mmap.len());
    let data: &[u8] = &mmap;
    let mut out = Vec::new();
    let mut start = 0;
    for end in memchr::memchr_iter(b'\n', data) {
        push_candidate(&mut out, &String::from_utf8_lossy(&data[start..end]));
        start = end + 1;
    }
    if start < data.len() {
        push_candidate(&mut out, &String::from_utf8_lossy(&data[start..]));
    }
    Ok(out)
}

fn push_candidate(out: &mut Vec<String>, line: &str) {
    let trimmed = line.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "hunter2\r\n\n  Zq7#xvK2  \n\t\npassword123";

    #[test]
    fn blank_lines_are_skipped_and_entries_trimmed() {
        let got = read_candidates_from(SAMPLE.as_bytes()).unwrap();
        assert_eq!(got, vec!["hunter2", "Zq7#xvK2", "password123"]);
    }

    #[test]
    fn mmap_and_buffered_reads_agree() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let buffered = read_candidates(f.path(), u64::MAX).unwrap();
        let mapped = read_candidates(f.path(), 0).unwrap();
        assert_eq!(buffered, mapped);
        assert_eq!(mapped.len(), 3);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_candidates("/definitely/not/here.txt", 0).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.txt"));
    }
}
