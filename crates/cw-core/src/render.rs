//! Outbound message text.

use chrono::{DateTime, Local};

use crate::display::{flag_for_region, mask_subscriber};
use crate::model::CallSummary;

/// Text sent when a call is first detected.
///
/// Goes out with HTML parse mode, so feed-derived values are escaped.
#[must_use]
pub fn detected_message(call: &CallSummary) -> String {
    let flag = flag_for_region(&call.region);
    let masked = escape_html(&mask_subscriber(&call.subscriber_id));
    format!(
        "🔥 NEW CALL {region} {flag} DETECTED ✨\n📞 Number: {masked}\n⏳ Waiting for Call 📞",
        region = escape_html(&call.region),
    )
}

/// Caption attached to an uploaded recording, stamped with `at`.
#[must_use]
pub fn received_caption(call: &CallSummary, at: DateTime<Local>) -> String {
    let flag = flag_for_region(&call.region);
    let masked = mask_subscriber(&call.subscriber_id);
    format!(
        "🔥 NEW CALL {region} {flag} RECEIVED ✨\n🌍 Country: {region} {flag}\n📞 Number: {masked}\n⏰ Time: {time}\n",
        region = call.region,
        time = at.format("%I:%M:%S %p"),
    )
}

/// Escape `&`, `<` and `>` for Telegram's HTML parse mode.
#[must_use]
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::region_from_termination;
    use crate::model::CallId;
    use chrono::TimeZone;

    fn call() -> CallSummary {
        CallSummary {
            id: CallId::new("A1"),
            subscriber_id: "85512345649".into(),
            region: "CAMBODIA".into(),
            duration_seconds: 0,
        }
    }

    #[test]
    fn detected_text() {
        assert_eq!(
            detected_message(&call()),
            "🔥 NEW CALL CAMBODIA 🇰🇭 DETECTED ✨\n📞 Number: 8551****649\n⏳ Waiting for Call 📞"
        );
    }

    #[test]
    fn caption_has_local_time() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 14, 3, 9).unwrap();
        let caption = received_caption(&call(), at);
        assert!(caption.starts_with("🔥 NEW CALL CAMBODIA 🇰🇭 RECEIVED ✨\n"));
        assert!(caption.contains("🌍 Country: CAMBODIA 🇰🇭\n"));
        assert!(caption.contains("📞 Number: 8551****649\n"));
        assert!(caption.contains("⏰ Time: 02:03:09 PM"));
        assert!(!caption.contains("85512345649"));
    }

    #[test]
    fn detected_text_escapes_feed_values() {
        let call = CallSummary {
            id: CallId::new("A2"),
            subscriber_id: "<1>&23".into(),
            region: region_from_termination("USA AT&T <Premium> Mobile"),
            duration_seconds: 0,
        };
        let text = detected_message(&call);
        assert_eq!(
            text,
            "🔥 NEW CALL USA AT&amp;T &lt;PREMIUM&gt; 🌍 DETECTED ✨\n📞 Number: &lt;***3\n⏳ Waiting for Call 📞"
        );
        let stripped = text.replace("&amp;", "").replace("&lt;", "").replace("&gt;", "");
        assert!(!stripped.contains(['&', '<', '>']));
    }

    #[test]
    fn escape_html_handles_ampersand_first() {
        assert_eq!(escape_html("a<b>&c"), "a&lt;b&gt;&amp;c");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }
}
