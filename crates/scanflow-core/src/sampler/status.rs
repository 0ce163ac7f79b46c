//! Status strings emitted by the sampler.

use crate::units::ByteSize;

/// Percentage at which the numeric percentage gives way to "(almost there!)".
const ALMOST_THERE_PCT: f64 = 99.0;

/// `"<written>/<total> @ <rate>/s (<pct>%)"`, or `(almost there!)` from 99% on.
pub(crate) fn progress_line(written: u64, total: u64, bytes_per_sec: f64) -> String {
    let mut status = format!(
        "{}/{} @ {}/s ",
        ByteSize(written),
        ByteSize(total),
        ByteSize(bytes_per_sec.max(0.0) as u64)
    );
    let pct = 100.0 * (written as f64 / total as f64);
    if pct >= ALMOST_THERE_PCT {
        status.push_str("(almost there!)");
    } else {
        status.push_str(&format!("({:.0}%)", pct));
    }
    status
}

pub(crate) fn done_line(total: u64) -> String {
    format!("{}/{} - done", ByteSize(total), ByteSize(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_shows_rounded_percentage() {
        assert_eq!(
            progress_line(512, 2048, 1024.0),
            "512 B/2.00 KiB @ 1.00 KiB/s (25%)"
        );
    }

    #[test]
    fn progress_line_switches_to_almost_there() {
        assert_eq!(
            progress_line(990, 1000, 4.0),
            "990 B/1000 B @ 4 B/s (almost there!)"
        );
        assert!(progress_line(989, 1000, 0.0).ends_with("(99%)"));
    }

    #[test]
    fn done_line_repeats_total() {
        assert_eq!(done_line(4096), "4.00 KiB/4.00 KiB - done");
    }
}
