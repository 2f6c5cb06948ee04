/// Largest magnitude below which integral values print without a fraction.
const INTEGRAL_DISPLAY_LIMIT: f64 = 1e16;

/// Renders a result for people: `14` rather than `14.0`, otherwise the
/// shortest representation that reads back to the same value.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < INTEGRAL_DISPLAY_LIMIT {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::format_number;

    #[test]
    fn integral_values_drop_the_fraction() {
        assert_eq!(format_number(14.0), "14");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(512.0), "512");
    }

    #[test]
    fn negative_zero_prints_as_zero() {
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn fractions_use_the_shortest_form() {
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(std::f64::consts::PI), "3.141592653589793");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }
}
