//! Fixed-layout text rendering of a [`Diff`].
//!
//! One line per metric: the label with a trailing colon, left-justified in
//! a 35-column field, followed by the value. Pause lines only appear when
//! the interval saw collection cycles.

use std::fmt;

use crate::diff::Diff;
use crate::fmt::{
    format_bytes, format_bytes_rate, format_opt, format_pause, format_pauses, format_rate,
};

/// Width of the label column, colon included.
pub const LABEL_WIDTH: usize = 35;

/// Renders `diff` as a multi-line report, each line newline-terminated.
pub fn render(diff: &Diff) -> String {
    diff.to_string()
}

fn write_field(f: &mut fmt::Formatter<'_>, label: &str, value: &str) -> fmt::Result {
    let label = format!("{}:", label);
    writeln!(f, "{:<width$}{}", label, value, width = LABEL_WIDTH)
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_field(f, "Allocated", &format_bytes(self.total_allocated))?;
        write_field(
            f,
            "Alloc / sec",
            &format_opt(self.alloc_rate(), format_bytes_rate),
        )?;
        write_field(f, "Alloc (still in use)", &format_bytes(self.live_bytes))?;
        write_field(
            f,
            "Heap bytes from system",
            &format_bytes(self.heap_system_bytes),
        )?;
        write_field(
            f,
            "Heap alloc (still in use)",
            &format_bytes(self.heap_live_bytes),
        )?;
        write_field(f, "Heap alloc objects", &self.heap_objects.to_string())?;
        write_field(
            f,
            "Heap alloc objects / sec",
            &format_opt(self.object_rate(), format_rate),
        )?;
        write_field(f, "Number of GCs", &self.gc_count_delta.to_string())?;

        if self.gc_count_delta > 0 {
            write_field(f, "Pause time", &format_pause(self.pause_total))?;
        }
        if let Some(mean) = self.mean_pause().filter(|_| self.gc_count_delta > 1) {
            write_field(f, "Mean pause time", &format_pause(mean))?;
            let mut pauses = format_pauses(&self.pauses);
            if self.pauses_missing {
                pauses.push_str(" (some missing)");
            }
            write_field(f, "Pause times (most recent first)", &pauses)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::SnapshotStore;
    use crate::collector::MockSource;

    fn diff_with_cycles(gc_count_delta: u64) -> Diff {
        Diff {
            elapsed: Duration::from_secs(1),
            gc_count_delta,
            pause_total: Duration::from_millis(gc_count_delta * 2),
            pauses: vec![Duration::from_millis(2); gc_count_delta as usize],
            ..Diff::default()
        }
    }

    fn line<'a>(report: &'a str, label: &str) -> Option<&'a str> {
        let prefix = format!("{}:", label);
        report.lines().find(|l| l.starts_with(&prefix))
    }

    #[test]
    fn every_line_has_fixed_label_column() {
        let report = render(&diff_with_cycles(3));
        assert_eq!(report.lines().count(), 11);
        assert!(report.ends_with('\n'));
        for l in report.lines() {
            let (label, value) = l.split_at(LABEL_WIDTH);
            assert!(label.trim_end().ends_with(':'), "bad label in {:?}", l);
            assert!(!value.starts_with(' '), "value not at column 35 in {:?}", l);
        }
    }

    #[test]
    fn field_order_is_fixed() {
        let report = render(&diff_with_cycles(2));
        let labels: Vec<&str> = report
            .lines()
            .map(|l| l[..LABEL_WIDTH].trim_end())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Allocated:",
                "Alloc / sec:",
                "Alloc (still in use):",
                "Heap bytes from system:",
                "Heap alloc (still in use):",
                "Heap alloc objects:",
                "Heap alloc objects / sec:",
                "Number of GCs:",
                "Pause time:",
                "Mean pause time:",
                "Pause times (most recent first):",
            ]
        );
    }

    #[test]
    fn no_cycles_no_pause_lines() {
        let report = render(&diff_with_cycles(0));
        assert!(!report.contains("Pause time"));
        assert!(!report.contains("Mean pause time"));
        assert_eq!(report.lines().count(), 8);
    }

    #[test]
    fn one_cycle_has_pause_time_only() {
        let report = render(&diff_with_cycles(1));
        assert!(report.contains("Pause time"));
        assert!(!report.contains("Mean pause time"));
        assert!(!report.contains("Pause times (most recent first)"));
        assert_eq!(
            line(&report, "Pause time").unwrap(),
            "Pause time:                        2ms"
        );
    }

    #[test]
    fn two_cycles_have_mean_and_list() {
        let report = render(&diff_with_cycles(2));
        assert!(report.contains("Pause time"));
        assert!(report.contains("Mean pause time"));
        assert!(line(&report, "Mean pause time").unwrap().ends_with("2ms"));
        assert!(
            line(&report, "Pause times (most recent first)")
                .unwrap()
                .ends_with("[2ms 2ms]")
        );
    }

    #[test]
    fn missing_pauses_are_flagged() {
        let mut diff = diff_with_cycles(10);
        diff.pauses.truncate(8);
        diff.pauses_missing = true;
        let report = render(&diff);
        assert!(
            line(&report, "Pause times (most recent first)")
                .unwrap()
                .ends_with("(some missing)")
        );
    }

    #[test]
    fn zero_elapsed_suppresses_rates() {
        let mut store = SnapshotStore::new(MockSource::frozen_clock());
        store.collect();
        store.collect();
        let report = render(&store.diff().unwrap());

        assert!(line(&report, "Alloc / sec").unwrap().ends_with(" -"));
        assert!(
            line(&report, "Heap alloc objects / sec")
                .unwrap()
                .ends_with(" -")
        );
        assert!(!report.contains("inf"));
        assert!(!report.contains("NaN"));
    }

    #[test]
    fn five_second_tick_report() {
        let mut store = SnapshotStore::new(MockSource::five_second_tick());
        store.collect();
        store.collect();
        let diff = store.diff().unwrap();
        assert_eq!(diff.total_allocated, 200_000);
        assert_eq!(diff.elapsed, Duration::from_secs(5));

        let report = render(&diff);
        let expected = "\
Allocated:                         200 kB
Alloc / sec:                       40 kB/s
Alloc (still in use):              600 kB
Heap bytes from system:            2.1 MB
Heap alloc (still in use):         590 kB
Heap alloc objects:                1500
Heap alloc objects / sec:          300.00
Number of GCs:                     1
Pause time:                        2ms
";
        assert_eq!(report, expected);
    }

    #[test]
    fn display_matches_render() {
        let diff = diff_with_cycles(2);
        assert_eq!(format!("{}", diff), render(&diff));
    }
}
