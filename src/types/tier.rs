use std::fmt;

use serde::{Deserialize, Serialize};

/// Account tier. Bounds the number of stored media and unlocks features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Basic,
    Pro,
    Premium,
}

/// Presentation template for a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Timeline,
    Blog,
    Gallery,
}

/// A capability that may be gated by tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Template(Template),
    CoverPhoto,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Basic, Tier::Pro, Tier::Premium];

    /// Maximum number of media an account on this tier may own.
    #[must_use]
    pub const fn content_limit(self) -> i64 {
        match self {
            Tier::Free => 20,
            Tier::Basic => 500,
            Tier::Pro => 1500,
            Tier::Premium => 5000,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Basic => "basic",
            Tier::Pro => "pro",
            Tier::Premium => "premium",
        }
    }

    pub fn parse(s: &str) -> Option<Tier> {
        match s {
            "free" => Some(Tier::Free),
            "basic" => Some(Tier::Basic),
            "pro" => Some(Tier::Pro),
            "premium" => Some(Tier::Premium),
            _ => None,
        }
    }

    /// Parses a stored tier value, treating anything unknown as free.
    #[must_use]
    pub fn parse_or_free(s: &str) -> Tier {
        Self::parse(s).unwrap_or_else(|| {
            tracing::warn!("Unknown tier '{}' in database, treating as free", s);
            Tier::Free
        })
    }

    /// The tier above this one, or `None` at the top.
    #[must_use]
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Free => Some(Tier::Basic),
            Tier::Basic => Some(Tier::Pro),
            Tier::Pro => Some(Tier::Premium),
            Tier::Premium => None,
        }
    }

    /// Returns true if this tier unlocks the feature. Free accounts get the
    /// timeline template only and no cover photo; paid tiers get everything.
    #[must_use]
    pub const fn allows(self, feature: Feature) -> bool {
        match (self, feature) {
            (Tier::Free, Feature::Template(Template::Timeline)) => true,
            (Tier::Free, _) => false,
            _ => true,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Template {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Template::Timeline => "timeline",
            Template::Blog => "blog",
            Template::Gallery => "gallery",
        }
    }

    pub fn parse(s: &str) -> Option<Template> {
        match s {
            "timeline" => Some(Template::Timeline),
            "blog" => Some(Template::Blog),
            "gallery" => Some(Template::Gallery),
            _ => None,
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits() {
        assert_eq!(Tier::Free.content_limit(), 20);
        assert_eq!(Tier::Basic.content_limit(), 500);
        assert_eq!(Tier::Pro.content_limit(), 1500);
        assert_eq!(Tier::Premium.content_limit(), 5000);
    }

    #[test]
    fn test_parse_round_trip_and_fallback() {
        for tier in Tier::ALL {
            assert_eq!(Tier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(Tier::parse("enterprise"), None);
        assert_eq!(Tier::parse_or_free("enterprise"), Tier::Free);
    }

    #[test]
    fn test_next_tier() {
        assert_eq!(Tier::Free.next(), Some(Tier::Basic));
        assert_eq!(Tier::Pro.next(), Some(Tier::Premium));
        assert_eq!(Tier::Premium.next(), None);
    }

    #[test]
    fn test_free_tier_capabilities() {
        assert!(Tier::Free.allows(Feature::Template(Template::Timeline)));
        assert!(!Tier::Free.allows(Feature::Template(Template::Blog)));
        assert!(!Tier::Free.allows(Feature::Template(Template::Gallery)));
        assert!(!Tier::Free.allows(Feature::CoverPhoto));
    }

    #[test]
    fn test_paid_tier_capabilities() {
        for tier in [Tier::Basic, Tier::Pro, Tier::Premium] {
            assert!(tier.allows(Feature::Template(Template::Gallery)));
            assert!(tier.allows(Feature::Template(Template::Blog)));
            assert!(tier.allows(Feature::CoverPhoto));
        }
    }
}
