const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

pub const UNKNOWN_SIZE: &str = "Unknown size";

/// Human readable byte count. Divides by 1024 while the value exceeds 1023,
/// so exactly 1024 bytes renders as "1 KB". GB is the largest unit.
pub fn format_size(bytes: i64) -> String {
    if bytes <= 0 {
        return UNKNOWN_SIZE.to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value > 1023.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{} {}", trim_decimals(value), UNITS[unit])
}

/// Two decimal places with trailing zeros dropped: 1.0 -> "1", 1.50 -> "1.5".
fn trim_decimals(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{:.2}", rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
