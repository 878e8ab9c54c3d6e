use std::fmt;

/// Remaining time until completion as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemainingTime {
    /// The server has not produced an estimate yet.
    #[default]
    Calculating,
    Known { minutes: u64, seconds: u64 },
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainingTime::Calculating => write!(f, "still calculating"),
            RemainingTime::Known { minutes, seconds } => write!(f, "{minutes} min {seconds} s"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEstimate {
    /// Always within `[0, 100]`.
    pub percent: f64,
    pub remaining: RemainingTime,
}

pub fn estimate(raw_percent: Option<f64>, raw_remaining_seconds: Option<f64>) -> ProgressEstimate {
    ProgressEstimate {
        percent: clamp_percent(raw_percent),
        remaining: remaining_time(raw_remaining_seconds),
    }
}

/// Absent or NaN input reads as 0.
pub fn clamp_percent(raw: Option<f64>) -> f64 {
    match raw {
        Some(value) if !value.is_nan() => value.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Whole minutes plus rounded seconds; a rounded 60 carries into the minutes.
pub fn remaining_time(raw_seconds: Option<f64>) -> RemainingTime {
    let Some(total) = raw_seconds.filter(|value| value.is_finite()) else {
        return RemainingTime::Calculating;
    };
    let total = total.max(0.0);
    let mut minutes = (total / 60.0).floor() as u64;
    let mut seconds = (total % 60.0).round() as u64;
    if seconds == 60 {
        minutes += 1;
        seconds = 0;
    }
    RemainingTime::Known { minutes, seconds }
}

/// Sanitized copy of the raw remaining time stored on the job.
pub(crate) fn sanitize_remaining(raw_seconds: Option<f64>) -> Option<f64> {
    raw_seconds
        .filter(|value| value.is_finite())
        .map(|value| value.max(0.0))
}
