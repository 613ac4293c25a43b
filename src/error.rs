//! Coarse error sentinels shared across component boundaries.
//!
//! Every public, fallible operation in this crate also returns a rich,
//! module-local `thiserror` enum. `Category` is the lossy projection of
//! that richer error onto the three-value sentinel set the rest of the
//! sync engine dispatches retry policy on (see spec §7).

use std::fmt;

/// Coarse network/DB result category.
///
/// `Ok` corresponds to success, `PermFail` to a final, non-retryable
/// failure, and `TempFail` to a failure the caller should retry (with
/// backoff) or that simply means "try again once conditions change"
/// (e.g. the shutdown flag being set mid-operation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Ok,
    PermFail,
    TempFail,
}

impl Category {
    /// Numeric sentinel matching the original `PSYNC_NET_*` constants.
    pub const fn code(self) -> i32 {
        match self {
            Category::Ok => 0,
            Category::PermFail => -1,
            Category::TempFail => -2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Ok => "ok",
            Category::PermFail => "perm-fail",
            Category::TempFail => "temp-fail",
        };
        f.write_str(s)
    }
}

/// The crypto back-end's thread-local-style error signal (spec §4.3).
///
/// Modeled as a plain enum carried on the error type rather than truly
/// thread-local state (spec §9 design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslSignal {
    WantRead,
    WantWrite,
    Unknown,
}

/// A trait implemented by every module-local error enum so callers can
/// recover the coarse sentinel without matching on every variant.
pub trait Categorize {
    fn category(&self) -> Category;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_codes_match_original_sentinels() {
        assert_eq!(Category::Ok.code(), 0);
        assert_eq!(Category::PermFail.code(), -1);
        assert_eq!(Category::TempFail.code(), -2);
    }
}
