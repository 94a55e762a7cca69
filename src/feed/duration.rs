use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound (inclusive) for a video to count as short-form content.
pub const SHORT_MAX_SECONDS: u64 = 62;

static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("Failed to compile duration regex")
});

/// Parses a `PT[nH][nM][nS]` duration into seconds.
///
/// Missing components count as zero and input that doesn't match at all
/// yields zero rather than an error.
pub fn parse_duration(duration: &str) -> u64 {
    let Some(caps) = DURATION_REGEX.captures(duration) else {
        return 0;
    };

    let component = |idx: usize| {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    component(1)
        .saturating_mul(3600)
        .saturating_add(component(2).saturating_mul(60))
        .saturating_add(component(3))
}

pub fn is_short(seconds: u64) -> bool {
    seconds <= SHORT_MAX_SECONDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_components() {
        assert_eq!(parse_duration("PT1H2M3S"), 3723);
        assert!(!is_short(parse_duration("PT1H2M3S")));
    }

    #[test]
    fn parses_partial_components() {
        assert_eq!(parse_duration("PT45S"), 45);
        assert_eq!(parse_duration("PT10M"), 600);
        assert_eq!(parse_duration("PT2H"), 7200);
        assert_eq!(parse_duration("PT1H30S"), 3630);
        assert!(is_short(parse_duration("PT45S")));
    }

    #[test]
    fn short_boundary_is_inclusive() {
        assert!(is_short(parse_duration("PT1M2S")));
        assert!(!is_short(parse_duration("PT1M3S")));
    }

    #[test]
    fn malformed_input_is_zero() {
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("garbage"), 0);
        assert_eq!(parse_duration("P1D"), 0);
        assert!(is_short(parse_duration("")));
    }
}
