//! Domain vocabulary shared by the repositories, services and HTTP layer.
//!
//! Values are persisted as lowercase strings; the enums here are the typed
//! view of those columns. Parsing is strict so a bad query parameter turns
//! into a validation error instead of an empty result.

pub mod events;
pub mod pagination;
pub mod ppv_gate;
pub mod slug;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current wall clock as UTC epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Error returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Kind of content a PPV config or purchase refers to.
    ContentType("content type") {
        Match => "match",
        Movie => "movie",
    }
}

string_enum! {
    /// What a hero slide points at.
    SlideContentType("slide content type") {
        Movie => "movie",
        Series => "series",
        Custom => "custom",
    }
}

string_enum! {
    /// Match lifecycle. Transitions are written by admins or the fixture sync.
    MatchStatus("match status") {
        Upcoming => "upcoming",
        Live => "live",
        Finished => "finished",
    }
}

string_enum! {
    Plan("plan") {
        Match => "match",
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
    }
}

string_enum! {
    SubscriptionStatus("subscription status") {
        Active => "active",
        Expired => "expired",
        Revoked => "revoked",
    }
}

string_enum! {
    PaymentStatus("payment status") {
        Pending => "pending",
        Success => "success",
        Failed => "failed",
    }
}

string_enum! {
    /// Where a redemption code came from.
    RedemptionSource("redemption source") {
        Manual => "manual",
        AutoPayment => "auto_payment",
    }
}

string_enum! {
    /// How a PPV purchase was obtained.
    AccessType("access type") {
        Paid => "paid",
        AdSupported => "ad_supported",
    }
}

string_enum! {
    AdNetwork("ad network") {
        Adsense => "adsense",
        Adsterra => "adsterra",
        Monetag => "monetag",
        Custom => "custom",
        Vast => "vast",
        Video => "video",
        Popup => "popup",
        Ppv => "ppv",
    }
}

string_enum! {
    AdFormat("ad format") {
        Responsive => "responsive",
        Banner => "banner",
        Native => "native",
        Interstitial => "interstitial",
        VideoPreroll => "video_preroll",
        VideoMidroll => "video_midroll",
        Popunder => "popunder",
        SocialBar => "social_bar",
    }
}

string_enum! {
    AdImpressionType("ad impression type") {
        Interstitial => "interstitial",
        Banner => "banner",
        Midroll => "midroll",
        Preroll => "preroll",
        PpvUnlock => "ppv_unlock",
    }
}

string_enum! {
    /// Target group for an admin broadcast.
    Audience("audience") {
        All => "all",
        Premium => "premium",
        Trial => "trial",
        Free => "free",
    }
}

string_enum! {
    SearchItemType("search item type") {
        Match => "match",
        Movie => "movie",
        Series => "series",
    }
}

string_enum! {
    ReleaseKind("release kind") {
        Movie => "movie",
        Series => "series",
    }
}

string_enum! {
    /// Day window used by the fixture sync.
    DayMode("day mode") {
        Yesterday => "yesterday",
        Today => "today",
        Tomorrow => "tomorrow",
    }
}

string_enum! {
    /// Background jobs that the scheduler runs and the CLI can trigger.
    JobName("job") {
        RotateFreeMovie => "rotate-free-movie",
        TrialExpiry => "trial-expiry",
        MatchReminders => "match-reminders",
        ExpireSubscriptions => "expire-subscriptions",
        SyncFixtures => "sync-fixtures",
    }
}

string_enum! {
    EmbedType("embed type") {
        M3u8 => "m3u8",
        Iframe => "iframe",
        Video => "video",
    }
}

impl Plan {
    /// Access length granted when a plan is bought without an explicit duration.
    #[must_use]
    pub const fn default_days(&self) -> i64 {
        match self {
            Self::Match => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::Yearly => 365,
        }
    }

    /// Device cap used when settings do not say otherwise.
    #[must_use]
    pub const fn default_max_devices(&self) -> i32 {
        match self {
            Self::Match => 1,
            Self::Weekly => 2,
            Self::Monthly => 3,
            Self::Yearly => 5,
        }
    }

    /// Monthly revenue equivalent used for MRR.
    #[must_use]
    pub fn monthly_equivalent(&self) -> f64 {
        match self {
            Self::Match => 1.50,
            Self::Weekly => 3.00 * 4.33,
            Self::Monthly => 6.00,
            Self::Yearly => 80.0 / 12.0,
        }
    }
}

impl DayMode {
    #[must_use]
    pub const fn day_offset(&self) -> i64 {
        match self {
            Self::Yesterday => -1,
            Self::Today => 0,
            Self::Tomorrow => 1,
        }
    }
}

/// A playable source attached to a movie, match or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub label: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(rename = "type", default = "default_embed_type")]
    pub kind: EmbedType,
    #[serde(default)]
    pub is_protected: bool,
}

const fn default_embed_type() -> EmbedType {
    EmbedType::Iframe
}

/// Decode a JSON-encoded list column, treating garbage as empty.
pub fn decode_list<T: serde::de::DeserializeOwned>(raw: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Encode a list for storage in a text column.
pub fn encode_list<T: Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Round a money value to cents.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_strings() {
        assert_eq!("ad_supported".parse::<AccessType>(), Ok(AccessType::AdSupported));
        assert_eq!(AdFormat::VideoPreroll.as_str(), "video_preroll");
        assert!("weeklyish".parse::<Plan>().is_err());
        assert_eq!(
            serde_json::to_string(&MatchStatus::Live).unwrap(),
            "\"live\""
        );
    }

    #[test]
    fn test_plan_defaults() {
        assert_eq!(Plan::Match.default_days(), 1);
        assert_eq!(Plan::Yearly.default_days(), 365);
        assert_eq!(Plan::Monthly.default_max_devices(), 3);
        assert!((Plan::Weekly.monthly_equivalent() - 12.99).abs() < 1e-9);
    }

    #[test]
    fn test_embed_defaults_to_iframe() {
        let embeds: Vec<Embed> =
            decode_list(r#"[{"label":"HD","url":"https://cdn.example/x"}]"#);
        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0].kind, EmbedType::Iframe);
        assert!(!embeds[0].is_protected);
        assert!(decode_list::<Embed>("not json").is_empty());
    }

    #[test]
    fn test_round2() {
        assert!((round2(12.345_67) - 12.35).abs() < 1e-9);
        assert!((round2(0.0) - 0.0).abs() < 1e-9);
    }
}
