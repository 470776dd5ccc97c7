use std::time::Duration;

const PINGWATCH_CONFIG: &str = "PINGWATCH_CONFIG";

pub fn get_config_path() -> Option<String> {
    let path_from_env = std::env::var(PINGWATCH_CONFIG);
    path_from_env.ok().filter(|path| !path.is_empty())
}

/// Human-readable form of an interval, e.g. "5 minutes" or "30 seconds".
pub fn describe_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if duration.subsec_nanos() != 0 || secs == 0 {
        return format!("{} ms", duration.as_millis());
    }

    let (amount, unit) = if secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };

    if amount == 1 {
        format!("{amount} {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}
