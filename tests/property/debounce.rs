use std::path::PathBuf;
use std::time::{Duration, Instant};

use proptest::prelude::*;

use bigeye::watch::{ChangeDebouncer, ChangeEvent, ChangeKind, IgnoreSet};

/// Window count for sorted offsets: a new window opens at the first event
/// at or after the previous window's deadline.
fn expected_windows(offsets: &[u64], delay: u64) -> usize {
    let mut windows = 0;
    let mut deadline: Option<u64> = None;
    for &t in offsets {
        if deadline.is_none_or(|d| t >= d) {
            windows += 1;
            deadline = Some(t + delay);
        }
    }
    windows
}

proptest! {
    #[test]
    fn one_trigger_per_window_and_no_event_lost(
        offsets in proptest::collection::vec(0u64..500, 1..40),
        delay in 1u64..60,
    ) {
        let mut offsets = offsets;
        offsets.sort_unstable();
        let t0 = Instant::now();
        let at = |ms: u64| t0 + Duration::from_millis(ms);

        let mut d = ChangeDebouncer::new(Duration::from_millis(delay), IgnoreSet::empty("/p"));
        let mut triggers = Vec::new();

        for (i, &t) in offsets.iter().enumerate() {
            triggers.extend(d.poll(at(t)));
            d.observe(ChangeEvent::new(ChangeKind::Modified, format!("/p/{i}")), at(t));
        }
        triggers.extend(d.poll(at(offsets[offsets.len() - 1] + delay)));

        prop_assert!(!d.is_pending());
        prop_assert_eq!(triggers.len(), expected_windows(&offsets, delay));
        prop_assert_eq!(triggers.iter().map(|t| t.collapsed).sum::<usize>(), offsets.len());
        prop_assert_eq!(&triggers[0].path, &PathBuf::from("/p/0"));
    }

    #[test]
    fn ignored_changes_never_trigger(
        names in proptest::collection::vec("[a-z]{1,8}", 1..20),
    ) {
        let ignore = IgnoreSet::new("/p", &["node_modules".to_string()]).unwrap();
        let mut d = ChangeDebouncer::new(Duration::from_millis(10), ignore);
        let t0 = Instant::now();

        for name in &names {
            let path = format!("/p/node_modules/{name}/index.js");
            prop_assert!(!d.observe(ChangeEvent::new(ChangeKind::Modified, path), t0));
        }

        prop_assert_eq!(d.deadline(), None);
        prop_assert_eq!(d.poll(t0 + Duration::from_secs(1)), None);
    }
}
