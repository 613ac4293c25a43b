//! Download and upload range descriptors (spec §3; `pnetlibs.h`'s
//! `psync_range_list_t`/`psync_upload_range_list_t`).

/// One piece of a file being assembled on download: either a straight
/// transfer from the remote, or a local copy from data we already have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub offset: u64,
    pub length: u64,
    pub kind: RangeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeKind {
    Transfer,
    CopyFromExisting { file_id: u64, hash: u64 },
    CopyFromPartialUpload { upload_id: u64 },
}

/// Checks the §3 invariant: ranges are non-overlapping, in ascending offset
/// order, and cover exactly `[0, filesize)` with no gaps.
pub fn validate_contiguous(ranges: &[Range], filesize: u64) -> bool {
    let mut expected = 0u64;
    for r in ranges {
        if r.offset != expected {
            return false;
        }
        expected = match expected.checked_add(r.length) {
            Some(next) => next,
            None => return false,
        };
    }
    expected == filesize
}

/// One piece of a file being assembled on upload (`psync_upload_range_list_t`):
/// adds `upload_offset` (position within the upload stream) and a stable `id`
/// alongside the same three-way kind split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRange {
    pub id: u32,
    pub upload_offset: u64,
    pub offset: u64,
    pub length: u64,
    pub kind: UploadRangeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRangeKind {
    Upload,
    CopyFile { file_id: u64, hash: u64 },
    CopyUpload { upload_id: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_ranges_covering_filesize_validate() {
        let ranges = vec![
            Range { offset: 0, length: 10, kind: RangeKind::Transfer },
            Range {
                offset: 10,
                length: 20,
                kind: RangeKind::CopyFromExisting { file_id: 1, hash: 2 },
            },
        ];
        assert!(validate_contiguous(&ranges, 30));
    }

    #[test]
    fn gap_or_overlap_fails_validation() {
        let gap = vec![
            Range { offset: 0, length: 10, kind: RangeKind::Transfer },
            Range { offset: 15, length: 5, kind: RangeKind::Transfer },
        ];
        assert!(!validate_contiguous(&gap, 20));

        let overlap = vec![
            Range { offset: 0, length: 10, kind: RangeKind::Transfer },
            Range { offset: 5, length: 10, kind: RangeKind::Transfer },
        ];
        assert!(!validate_contiguous(&overlap, 15));
    }

    #[test]
    fn ranges_not_covering_full_filesize_fail() {
        let short = vec![Range { offset: 0, length: 10, kind: RangeKind::Transfer }];
        assert!(!validate_contiguous(&short, 20));
    }
}
