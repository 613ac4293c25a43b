//! File-extension classifier (spec §4.2).
//!
//! The trailing suffix of a filename is packed into a compact `u32` key and
//! looked up in a sorted, `const` table by binary search, avoiding string
//! comparison in the hot local-scan path. The extension-to-category mapping
//! below is carried over from the original client's `pscanexts.h`; the
//! integer encoding itself is this crate's own (only the wire format in
//! spec §6 needs to match the original bit-for-bit — this table is purely
//! an internal lookup key).

/// Media category assigned to a recognized extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Picture,
    Video,
    Audio,
    Document,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Picture => "pictures",
            Category::Video => "videos",
            Category::Audio => "music files",
            Category::Document => "documents",
        }
    }
}

/// Packs up to 4 lowercase-ASCII-alphanumeric bytes into a base-37 digit
/// string: digit 0 is reserved (never produced here, since every input
/// byte maps to 1..=36), `a..=z` map to `1..=26`, `0..=9` map to `27..=36`.
/// Bytes outside that set (and anything past the 4th) are ignored, mirroring
/// the original "up to 4 bytes" truncation.
fn pack(ext: &str) -> u32 {
    let mut acc: u32 = 0;
    for c in ext.chars().take(4) {
        let digit = if c.is_ascii_lowercase() {
            (c as u32) - ('a' as u32) + 1
        } else if c.is_ascii_digit() {
            (c as u32) - ('0' as u32) + 27
        } else {
            continue;
        };
        acc = acc * 37 + digit;
    }
    acc
}

include!("classify_table.rs");

/// Classifies a filename by its trailing extension. Returns `None`
/// ("unclassified") if the extension is absent or not in the table.
pub fn classify(filename: &str) -> Option<Category> {
    let ext = filename.rsplit_once('.')?.1;
    if ext.is_empty() {
        return None;
    }
    let lower: String = ext.chars().map(|c| c.to_ascii_lowercase()).collect();
    let key = pack(&lower);
    EXTENSION_TABLE
        .binary_search_by_key(&key, |(k, _)| *k)
        .ok()
        .map(|idx| EXTENSION_TABLE[idx].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_for_binary_search() {
        let mut prev = None;
        for (key, _) in EXTENSION_TABLE {
            if let Some(p) = prev {
                assert!(*key > p, "extension table must be strictly sorted");
            }
            prev = Some(*key);
        }
    }

    #[test]
    fn classifies_known_extensions_case_insensitively() {
        assert_eq!(classify("movie.MP4"), Some(Category::Video));
        assert_eq!(classify("photo.JPG"), Some(Category::Picture));
        assert_eq!(classify("song.mp3"), Some(Category::Audio));
        assert_eq!(classify("notes.txt"), Some(Category::Document));
    }

    #[test]
    fn unclassified_for_unknown_or_missing_extension() {
        assert_eq!(classify("archive.tar.gz"), None);
        assert_eq!(classify("noext"), None);
        assert_eq!(classify("trailing."), None);
    }

    #[test]
    fn sampled_table_entries_round_trip_through_classify() {
        for &(ext, category) in EXTENSION_NAMES {
            let name = format!("anything.{ext}");
            assert_eq!(classify(&name), Some(category), "extension {ext}");
        }
    }

    proptest::proptest! {
        #[test]
        fn classify_is_case_insensitive_for_every_sampled_extension(
            idx in 0..EXTENSION_NAMES.len(),
            upper in proptest::bool::ANY,
        ) {
            let (ext, category) = EXTENSION_NAMES[idx];
            let ext = if upper { ext.to_uppercase() } else { ext.to_string() };
            let name = format!("file.{ext}");
            proptest::prop_assert_eq!(classify(&name), Some(category));
        }
    }
}
