use sha2::{Digest, Sha256};

const MAX_STEM_LEN: usize = 64;

/// File stem for a job's output files. Server ids are usually UUIDs and pass
/// through unchanged; anything unsafe on disk is replaced and suffixed with a
/// short hash of the raw id so that distinct ids never collide.
pub fn job_file_stem(job_id: &str) -> String {
    let cleaned: String = job_id
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let mut stem = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    let altered = stem != job_id;
    if stem.is_empty() {
        stem = "job".to_string();
    }
    if stem.len() > MAX_STEM_LEN {
        let mut cut = MAX_STEM_LEN;
        while !stem.is_char_boundary(cut) {
            cut -= 1;
        }
        stem.truncate(cut);
    }
    if altered || stem.len() != job_id.len() || is_reserved_windows_name(&stem) {
        format!("{stem}--{}", short_hash(job_id))
    } else {
        stem
    }
}

/// Hex SHA-256 of `bytes`, used in the export manifest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_prefix(&Sha256::digest(bytes), usize::MAX)
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    hex_prefix(&Sha256::digest(input.as_bytes()), 4)
}

fn hex_prefix(digest: &[u8], bytes: usize) -> String {
    use std::fmt::Write;
    let mut hex = String::with_capacity(digest.len().min(bytes) * 2);
    for byte in digest.iter().take(bytes) {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
