/// Shared utility functions for the cycle calendar service
///
/// Parse the digits embedded in a loosely formatted numeric cell
///
/// Cycle and zone columns are typed by hand and often carry extra text such as
/// "Cycle 3", "#12" or "Zone-07". Every non-digit character is discarded and the
/// remaining digits are read as a single number. A value with no digits reads as 0,
/// and digit runs too large for a `u32` saturate to `u32::MAX`.
///
/// # Examples
///
/// ```
/// use cycle_calendar_service::utils::parse_digits;
///
/// assert_eq!(parse_digits("12"), 12);
/// assert_eq!(parse_digits("Cycle 3"), 3);
/// assert_eq!(parse_digits("Zone-07"), 7);
/// assert_eq!(parse_digits("n/a"), 0);
/// ```
pub fn parse_digits(value: &str) -> u32 {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }

    // Only digits remain, so the only possible failure is overflow
    digits.parse::<u32>().unwrap_or(u32::MAX)
}
