//! Duration labels shown in menus and confirmations.

const MINUTE: u32 = 60;
const HOUR: u32 = 3600;

fn plural(n: u32, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Human-readable duration: `"45 seconds"`, `"2 minutes"`, `"1 hour 30 minutes"`.
///
/// Below an hour only whole minutes are shown; leftover seconds are truncated.
pub fn format_duration(seconds: u32) -> String {
    if seconds < MINUTE {
        return format!("{seconds} seconds");
    }
    if seconds < HOUR {
        return plural(seconds / MINUTE, "minute");
    }

    let hours = seconds / HOUR;
    let minutes = (seconds % HOUR) / MINUTE;
    if minutes > 0 {
        format!("{} {}", plural(hours, "hour"), plural(minutes, "minute"))
    } else {
        plural(hours, "hour")
    }
}

/// Compact `"Xh"` / `"Xh Ym"` label for the custom-timer keyboard.
pub fn format_hours_minutes(seconds: u32) -> String {
    let hours = seconds / HOUR;
    let minutes = (seconds % HOUR) / MINUTE;
    if minutes > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{hours}h")
    }
}

/// Compact `"1h 2m 3s"` label for the group-settings keyboard. Zero parts are skipped,
/// except that a zero duration renders as `"0s"`.
pub fn format_compact(seconds: u32) -> String {
    let hours = seconds / HOUR;
    let minutes = (seconds % HOUR) / MINUTE;
    let secs = seconds % MINUTE;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }
    parts.join(" ")
}
