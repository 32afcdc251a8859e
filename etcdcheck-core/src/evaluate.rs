///! Status evaluator
///! Reduces reconciled member health to a single verdict

use etcdcheck_common::{Error, MemberHealth, Result, Status, Verdict};

/// Dead-member counts (inclusive) at which the check escalates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thresholds {
    warning: Option<usize>,
    critical: Option<usize>,
}

impl Thresholds {
    /// Rejects a warning threshold above the critical one
    pub fn new(warning: Option<usize>, critical: Option<usize>) -> Result<Self> {
        if let (Some(w), Some(c)) = (warning, critical) {
            if w > c {
                return Err(Error::Configuration(format!(
                    "Warning threshold ({}) cannot be greater than critical one ({})",
                    w, c
                )));
            }
        }
        Ok(Self { warning, critical })
    }

    pub fn warning(&self) -> Option<usize> {
        self.warning
    }

    pub fn critical(&self) -> Option<usize> {
        self.critical
    }

    /// Critical wins over warning. Without a firing threshold the result is OK
    /// even when members are dead.
    pub fn status_for(&self, dead: usize) -> Status {
        if self.critical.is_some_and(|c| dead >= c) {
            Status::Critical
        } else if self.warning.is_some_and(|w| dead >= w) {
            Status::Warning
        } else {
            Status::Ok
        }
    }
}

pub fn evaluate(records: &[MemberHealth], thresholds: &Thresholds) -> Verdict {
    let (healthy, dead): (Vec<&MemberHealth>, Vec<&MemberHealth>) =
        records.iter().partition(|record| record.healthy);

    let listing = if dead.is_empty() {
        healthy
            .iter()
            .map(|record| record.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        dead.iter()
            .map(|record| format!("{}: {}", record.name, record.error_text()))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let summary = format!("{}/{} healthy nodes: {}", healthy.len(), records.len(), listing);

    let detail = healthy
        .iter()
        .map(|record| format!("{}: healthy: took {}", record.name, record.latency))
        .chain(dead.iter().map(|record| {
            format!("{}: dead: took {}: {}", record.name, record.latency, record.error_text())
        }))
        .collect::<Vec<_>>()
        .join("\n");

    Verdict::new(thresholds.status_for(dead.len()), summary).with_detail(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, healthy: bool) -> MemberHealth {
        MemberHealth {
            id: 1,
            name: name.to_string(),
            peer_urls: vec![format!("http://{}:2380", name)],
            client_urls: vec![],
            healthy,
            latency: "2ms".to_string(),
            error: (!healthy).then(|| "connection refused".to_string()),
        }
    }

    fn cluster(dead: usize, total: usize) -> Vec<MemberHealth> {
        (0..total)
            .map(|i| record(&format!("etcd{}", i + 1), i >= dead))
            .collect()
    }

    #[test]
    fn test_all_healthy_lists_names() {
        let verdict = evaluate(&cluster(0, 3), &Thresholds::default());
        assert_eq!(verdict.status, Status::Ok);
        assert_eq!(verdict.summary, "3/3 healthy nodes: etcd1, etcd2, etcd3");
        assert_eq!(
            verdict.detail.as_deref(),
            Some("etcd1: healthy: took 2ms\netcd2: healthy: took 2ms\netcd3: healthy: took 2ms")
        );
    }

    #[test]
    fn test_dead_without_thresholds_is_ok() {
        let verdict = evaluate(&cluster(1, 3), &Thresholds::default());
        assert_eq!(verdict.status, Status::Ok);
        assert_eq!(verdict.summary, "2/3 healthy nodes: etcd1: connection refused");
    }

    #[test]
    fn test_detail_lists_healthy_before_dead() {
        let verdict = evaluate(&cluster(1, 2), &Thresholds::default());
        assert_eq!(
            verdict.detail.as_deref(),
            Some("etcd2: healthy: took 2ms\netcd1: dead: took 2ms: connection refused")
        );
    }

    #[test]
    fn test_critical_checked_before_warning() {
        let thresholds = Thresholds::new(Some(1), Some(2)).unwrap();
        assert_eq!(evaluate(&cluster(3, 5), &thresholds).status, Status::Critical);
    }

    #[test]
    fn test_warning_range() {
        let thresholds = Thresholds::new(Some(1), Some(2)).unwrap();
        let verdict = evaluate(&cluster(1, 3), &thresholds);
        assert_eq!(verdict.status, Status::Warning);
        assert!(verdict.summary.starts_with("2/3 healthy nodes: "));
    }

    #[test]
    fn test_monotonic_in_dead_count() {
        let all = [
            Thresholds::default(),
            Thresholds::new(Some(1), None).unwrap(),
            Thresholds::new(None, Some(2)).unwrap(),
            Thresholds::new(Some(1), Some(2)).unwrap(),
            Thresholds::new(Some(2), Some(2)).unwrap(),
            Thresholds::new(Some(0), Some(3)).unwrap(),
        ];
        for thresholds in all {
            let mut previous = Status::Ok;
            for dead in 0..=5 {
                let status = evaluate(&cluster(dead, 5), &thresholds).status;
                assert!(status >= previous, "{:?} at dead={}", thresholds, dead);
                previous = status;
            }
        }
    }

    #[test]
    fn test_warning_above_critical_rejected() {
        let err = Thresholds::new(Some(3), Some(2)).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(err.status(), Status::Unknown);
    }

    #[test]
    fn test_dead_without_error_text() {
        let mut records = cluster(1, 1);
        records[0].error = None;
        let verdict = evaluate(&records, &Thresholds::default());
        assert_eq!(verdict.summary, "0/1 healthy nodes: etcd1: unknown error");
    }
}
