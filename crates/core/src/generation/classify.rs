//! Remote failure classification.
//!
//! Classification looks only at the failure text, so the same message always
//! lands in the same bucket regardless of which attempt produced it.

use std::fmt;

/// What kind of remote failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Rate limit or quota exhausted.
    QuotaExceeded,
    /// Transient server overload.
    Overloaded,
    /// Refused by content policy.
    SafetyBlocked,
    /// Anything else: bad input, auth, network, unknown.
    FatalOther,
}

impl FailureKind {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retriable(self) -> bool {
        matches!(self, FailureKind::QuotaExceeded | FailureKind::Overloaded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::QuotaExceeded => "quota_exceeded",
            FailureKind::Overloaded => "overloaded",
            FailureKind::SafetyBlocked => "safety_blocked",
            FailureKind::FatalOther => "fatal_other",
        }
    }

    /// User-facing message for an image-generation failure of this kind.
    ///
    /// `detail` is the raw failure text; only the catch-all shows it.
    pub fn user_message(self, detail: &str) -> String {
        match self {
            FailureKind::QuotaExceeded => {
                "Image generation quota exceeded. Please wait a minute and try again.".to_string()
            }
            FailureKind::Overloaded => {
                "The image service is overloaded right now. Please try again in a few moments.".to_string()
            }
            FailureKind::SafetyBlocked => {
                "The image was blocked by the content safety policy. Try rephrasing the request or using a different image.".to_string()
            }
            FailureKind::FatalOther => format!("Image generation failed: {}", summarize(detail)),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const QUOTA_SIGNALS: &[&str] = &["429", "resource_exhausted", "quota", "rate limit", "ratelimit", "too many requests"];

const OVERLOAD_SIGNALS: &[&str] = &[
    "503",
    "overloaded",
    "unavailable",
    "high demand",
    "try again later",
    "deadline_exceeded",
];

const SAFETY_SIGNALS: &[&str] = &[
    "safety",
    "prohibited_content",
    "blocklist",
    "content policy",
    "responsible ai",
    "image_safety",
    "spii",
    "blocked",
];

/// Classifies a failure message.
///
/// Quota signals are checked first, then overload, then safety; the first
/// match wins.
pub fn classify_failure(message: &str) -> FailureKind {
    let lower = message.to_ascii_lowercase();
    let has_any = |signals: &[&str]| signals.iter().any(|s| lower.contains(s));

    if has_any(QUOTA_SIGNALS) {
        FailureKind::QuotaExceeded
    } else if has_any(OVERLOAD_SIGNALS) {
        FailureKind::Overloaded
    } else if has_any(SAFETY_SIGNALS) {
        FailureKind::SafetyBlocked
    } else {
        FailureKind::FatalOther
    }
}

fn summarize(detail: &str) -> String {
    const MAX: usize = 200;
    let trimmed = detail.trim();
    if trimmed.chars().count() <= MAX {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(MAX).collect();
    cut.push('…');
    cut
}
