//! Referrer and user-agent classification
//!
//! Each classifier is an ordered rule table: rules are checked top to bottom and
//! the first one whose needles match decides the result.

use url::Url;

use crate::analytics::models::DeviceClass;

/// Referrer value recorded when the visit had no referring page
pub const DIRECT: &str = "direct";

/// Display label for [`DIRECT`]
pub const DIRECT_LABEL: &str = "Direct access";

/// Matched against the lowercased user agent
const DEVICE_RULES: &[(&[&str], DeviceClass)] = &[
    (&["mobile", "android", "iphone"], DeviceClass::Mobile),
    (&["tablet", "ipad"], DeviceClass::Tablet),
];

/// Matched case-sensitively anywhere in the referrer domain
const REFERRER_LABELS: &[(&[&str], &str)] = &[
    (&["google"], "Google"),
    (&["bing"], "Bing"),
    (&["facebook"], "Facebook"),
    (&["instagram"], "Instagram"),
    (&["twitter", "x.com"], "Twitter/X"),
    (&["linkedin"], "LinkedIn"),
    (&["youtube"], "YouTube"),
];

/// Reduce a referrer to the host it came from.
///
/// Empty and `"direct"` referrers map to `"direct"`. Anything that does not
/// parse as an absolute URL is returned unchanged.
pub fn extract_domain(referrer: &str) -> String {
    if referrer.is_empty() || referrer == DIRECT {
        return DIRECT.to_string();
    }

    match Url::parse(referrer) {
        // URLs without a host (mailto:, data:) have an empty hostname
        Ok(url) => url.host_str().unwrap_or_default().to_string(),
        Err(_) => referrer.to_string(),
    }
}

/// Human readable label for a referrer domain
pub fn format_referrer(domain: &str) -> String {
    if domain == DIRECT {
        return DIRECT_LABEL.to_string();
    }

    REFERRER_LABELS
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| domain.contains(needle)))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| domain.to_string())
}

/// Classify a user agent as mobile, tablet or desktop
pub fn detect_device(user_agent: &str) -> DeviceClass {
    let ua = user_agent.to_lowercase();

    DEVICE_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| ua.contains(needle)))
        .map(|(_, class)| *class)
        .unwrap_or(DeviceClass::Desktop)
}
