//! Command implementations.

pub mod canon;
pub mod diff;
pub mod merge;
pub mod package;
pub mod run;

use chrono::Utc;

/// The request timestamp stamped onto diff rows: textual compare equals
/// chronological compare.
pub fn request_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_sortable_format() {
        let ts = request_timestamp();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }
}
