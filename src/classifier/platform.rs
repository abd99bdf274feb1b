use regex::Regex;
use std::sync::LazyLock;

use crate::model::Platform;

/// One row of the URL signature table
pub struct PlatformSignature {
    pub platform: Platform,
    pattern: Regex,
    pub confidence: f64,
    pub is_video: bool,
    pub is_social: bool,
}

impl PlatformSignature {
    fn new(
        platform: Platform,
        pattern: &str,
        confidence: f64,
        is_video: bool,
        is_social: bool,
    ) -> Self {
        PlatformSignature {
            platform,
            pattern: Regex::new(pattern).unwrap(),
            confidence,
            is_video,
            is_social,
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}

const HOST_PREFIX: &str = r"(?i)^https?://([a-z0-9-]+\.)*";

/// Ordered signature table. The first match wins, so specific video paths
/// come before the catch-all entry for the same host.
static SIGNATURES: LazyLock<Vec<PlatformSignature>> = LazyLock::new(|| {
    let sig = |platform, rest: &str, confidence, is_video, is_social| {
        PlatformSignature::new(
            platform,
            &format!("{HOST_PREFIX}{rest}"),
            confidence,
            is_video,
            is_social,
        )
    };

    vec![
        // Short-form video
        sig(Platform::Tiktok, r"tiktok\.com/(@[^/]+/video/\d+|t/|v/)", 0.95, true, true),
        sig(Platform::Tiktok, r"tiktok\.com/", 0.93, true, true),
        sig(Platform::Instagram, r"instagram\.com/(reels?|tv)/[^/?#]+", 0.95, true, true),
        sig(Platform::Instagram, r"instagram\.com/", 0.92, false, true),
        sig(Platform::Youtube, r"youtube\.com/(watch\?(.*&)?v=|shorts/)[^/]*", 0.95, true, true),
        sig(Platform::Youtube, r"youtu\.be/[^/?#]+", 0.95, true, true),
        sig(Platform::Youtube, r"youtube\.com/", 0.92, false, true),
        sig(Platform::Facebook, r"(facebook\.com/.+/videos/|facebook\.com/(watch|reel)/|fb\.watch/)", 0.93, true, true),
        sig(Platform::Facebook, r"facebook\.com/", 0.91, false, true),
        sig(Platform::Pinterest, r"(pinterest\.[a-z.]+/pin/|pin\.it/)", 0.93, false, true),
        // Recipe content domains
        sig(Platform::Allrecipes, r"allrecipes\.com/", 0.92, false, false),
        sig(Platform::FoodNetwork, r"foodnetwork\.(com|co\.uk)/", 0.92, false, false),
        sig(Platform::BbcGoodFood, r"bbcgoodfood\.com/", 0.92, false, false),
        sig(Platform::SeriousEats, r"seriouseats\.com/", 0.92, false, false),
        sig(Platform::Epicurious, r"epicurious\.com/", 0.92, false, false),
        sig(Platform::BonAppetit, r"bonappetit\.com/", 0.92, false, false),
        sig(Platform::NytCooking, r"cooking\.nytimes\.com/", 0.92, false, false),
        sig(Platform::Tasty, r"tasty\.co/", 0.92, false, false),
    ]
});

/// Find the first signature matching a normalized URL
pub fn match_platform(url: &str) -> Option<&'static PlatformSignature> {
    SIGNATURES.iter().find(|signature| signature.matches(url))
}
