//! Name translation between TD names (`camelCase`) and URL segments /
//! handler identifiers (`snake_case`).

/// `turnOn` -> `turn_on`, `setHTTPMode` -> `set_http_mode`.
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (next_is_lower && prev != '_');
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("turnOn"), "turn_on");
        assert_eq!(camel_to_snake("setFanSpeed"), "set_fan_speed");
        assert_eq!(camel_to_snake("returnToDock"), "return_to_dock");
        assert_eq!(camel_to_snake("pickup"), "pickup");
        assert_eq!(camel_to_snake("fan_speed"), "fan_speed");
        assert_eq!(camel_to_snake("setHTTPMode"), "set_http_mode");
        assert_eq!(camel_to_snake("level2Mode"), "level2_mode");
    }
}
