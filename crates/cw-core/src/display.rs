//! Display helpers: region derivation, caller-id masking and flag markers.

use crate::country;

/// Region used when none can be derived.
pub const UNKNOWN_REGION: &str = "UNKNOWN";

/// Marker used when the region maps to no known country.
pub const GLOBE: &str = "🌍";

/// Derive a region name from a termination descriptor.
///
/// Words are upper-cased and collected until the first `mobile` word
/// (any case) or the first all-digit word.
///
/// ```
/// use cw_core::display::region_from_termination;
/// assert_eq!(region_from_termination("United Kingdom Mobile 44"), "UNITED KINGDOM");
/// assert_eq!(region_from_termination("123 France"), "UNKNOWN");
/// ```
#[must_use]
pub fn region_from_termination(termination: &str) -> String {
    let words: Vec<String> = termination
        .split_whitespace()
        .take_while(|word| {
            !word.eq_ignore_ascii_case("mobile") && !word.chars().all(|c| c.is_ascii_digit())
        })
        .map(str::to_uppercase)
        .collect();

    if words.is_empty() {
        UNKNOWN_REGION.to_string()
    } else {
        words.join(" ")
    }
}

/// Mask a caller id for display.
///
/// Longer than 7 characters: first 4, `****`, last 3. Otherwise first 1,
/// `***`, last 1.
#[must_use]
pub fn mask_subscriber(subscriber: &str) -> String {
    let chars: Vec<char> = subscriber.chars().collect();
    let len = chars.len();
    if len > 7 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[len - 3..].iter().collect();
        format!("{head}****{tail}")
    } else {
        let head: String = chars.iter().take(1).collect();
        let tail: String = chars.iter().skip(len.saturating_sub(1)).collect();
        format!("{head}***{tail}")
    }
}

/// Flag marker for a region name, [`GLOBE`] when unknown.
#[must_use]
pub fn flag_for_region(region: &str) -> String {
    country_code(region).map_or_else(|| GLOBE.to_string(), regional_indicators)
}

/// ISO 3166 alpha-2 code for a country name or code (case-insensitive).
///
/// ```
/// use cw_core::display::country_code;
/// assert_eq!(country_code("new zealand"), Some("NZ"));
/// assert_eq!(country_code("Ivory  Coast"), Some("CI"));
/// assert_eq!(country_code("sn"), Some("SN"));
/// ```
#[must_use]
pub fn country_code(region: &str) -> Option<&'static str> {
    let needle = region.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
    if needle.is_empty() {
        return None;
    }
    country::alpha2(&needle)
}

fn regional_indicators(code: &str) -> String {
    code.chars()
        .filter_map(|c| char::from_u32(0x1F1E6 + (u32::from(c) - u32::from('A'))))
        .collect()
}
