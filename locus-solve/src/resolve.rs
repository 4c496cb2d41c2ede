//! Frame name resolution against the pose registry.
//!
//! Detection tables name frames loosely: a bare index (`12`), an index that
//! went through a float column (`12.0`), or a file name whose extension may
//! differ from the one the SfM solver registered. Poses are keyed by the
//! exact image name, so every lookup goes through [`resolve_frame`].

use locus_data::PoseRegistry;

/// Extensions probed, in order, after the stem is built.
pub const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Build the file stem a raw frame value refers to.
///
/// Plain frame numbers (`12`, `12.0`) become `frame_%04d`; anything else
/// keeps the part of its file name before the first `.`.
pub fn frame_stem(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(index) = frame_index(raw) {
        return format!("frame_{:04}", index);
    }
    let file_name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    file_name.split('.').next().unwrap_or(file_name).to_string()
}

/// `12` or `12.0`: ASCII digits, optionally followed by a fraction of zeros.
fn frame_index(raw: &str) -> Option<u64> {
    let (digits, fraction) = raw.split_once('.').unwrap_or((raw, "0"));
    let is_digits = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
    let is_zero_fraction = !fraction.is_empty() && fraction.bytes().all(|b| b == b'0');
    if !(is_digits && is_zero_fraction) {
        return None;
    }
    digits.parse().ok()
}

/// Resolve a raw frame value to the registry key it refers to.
///
/// An exact key match wins; otherwise `stem.jpg`, `stem.jpeg` and
/// `stem.png` are probed in that order.
pub fn resolve_frame<'a>(raw: &str, registry: &'a PoseRegistry) -> Option<&'a str> {
    let raw = raw.trim();
    if let Some((key, _)) = registry.pose_entry(raw) {
        return Some(key);
    }

    let stem = frame_stem(raw);
    FRAME_EXTENSIONS.iter().find_map(|ext| {
        registry
            .pose_entry(&format!("{}.{}", stem, ext))
            .map(|(key, _)| key)
    })
}
