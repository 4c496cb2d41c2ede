//! COLMAP text model parsing (`cameras.txt`, `images.txt`).
//!
//! Lines are read as raw bytes and only record lines are decoded, so a stray
//! non-UTF-8 byte costs at most one record.

mod cameras;
mod images;

pub use cameras::{load_intrinsics, parse_intrinsics};
pub use images::{load_poses, parse_poses};

use std::io::{self, BufRead};

/// Undecoded lines of `reader`, without the trailing `\n` or `\r\n`.
fn raw_lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<Vec<u8>>> {
    reader.split(b'\n').map(|line| {
        line.map(|mut bytes| {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            bytes
        })
    })
}

/// Comment or blank line in a COLMAP text file.
fn is_skippable(line: &[u8]) -> bool {
    let trimmed = line.trim_ascii();
    trimmed.is_empty() || trimmed.starts_with(b"#")
}
