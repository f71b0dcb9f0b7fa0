use chrono::{DateTime, Utc};

pub fn now_ts() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Human readable time left until `expiration`. Zero means the order never
/// expires.
pub fn time_remaining(expiration: u64, now: u64) -> String {
    if expiration == 0 {
        return "NEVER".to_string();
    }

    let Some(end) = DateTime::<Utc>::from_timestamp(expiration as i64, 0) else {
        return "INVALID".to_string();
    };
    let Some(now) = DateTime::<Utc>::from_timestamp(now as i64, 0) else {
        return "INVALID".to_string();
    };
    let diff = end - now;

    if diff.num_seconds() <= 0 {
        return "EXPIRED".to_string();
    }

    let days = diff.num_days();
    let hours = diff.num_hours() % 24;
    let mins = diff.num_minutes() % 60;

    if days > 0 {
        format!("{}d {:02}h {:02}m", days, hours, mins)
    } else {
        format!("{:02}h {:02}m {:02}s", hours, mins, diff.num_seconds() % 60)
    }
}
