/// Live wpm observed at a point in a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WpmSample {
    pub elapsed_secs: u64,
    pub wpm: f64,
}

impl WpmSample {
    pub fn new(elapsed_secs: u64, wpm: f64) -> Self {
        Self { elapsed_secs, wpm }
    }
}

impl From<(u64, f64)> for WpmSample {
    fn from(v: (u64, f64)) -> Self {
        WpmSample {
            elapsed_secs: v.0,
            wpm: v.1,
        }
    }
}

impl From<WpmSample> for (f64, f64) {
    fn from(s: WpmSample) -> Self {
        (s.elapsed_secs as f64, s.wpm)
    }
}

/// Highest and lowest wpm across samples, ignoring the first `warmup` seconds.
pub fn wpm_range(samples: &[WpmSample], warmup: u64) -> Option<(f64, f64)> {
    samples
        .iter()
        .filter(|s| s.elapsed_secs >= warmup)
        .fold(None, |acc, s| match acc {
            None => Some((s.wpm, s.wpm)),
            Some((lo, hi)) => Some((lo.min(s.wpm), hi.max(s.wpm))),
        })
}
