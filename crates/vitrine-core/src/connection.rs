use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Viewports narrower than this are treated as mobile devices.
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

/// Network Information API `effectiveType` buckets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectiveType {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[default]
    #[serde(rename = "4g")]
    FourG,
}

impl EffectiveType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow2g => "slow-2g",
            Self::TwoG => "2g",
            Self::ThreeG => "3g",
            Self::FourG => "4g",
        }
    }

    pub fn is_slow(self) -> bool {
        matches!(self, Self::Slow2g | Self::TwoG)
    }

    /// Parse a reported value; anything unrecognised is treated as `4g`.
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for EffectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => Ok(Self::Slow2g),
            "2g" => Ok(Self::TwoG),
            "3g" => Ok(Self::ThreeG),
            "4g" => Ok(Self::FourG),
            other => Err(format!("unknown effective type: {other}")),
        }
    }
}

/// Snapshot of network and device conditions at the moment of a decision.
///
/// Loaders receive a fresh profile per decision from a [`ConnectionSource`]; a profile is
/// never cached across elements because conditions change while a page is open.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub effective_type: EffectiveType,
    pub save_data: bool,
    pub is_mobile: bool,
    pub downlink_mbps: f64,
    pub rtt_ms: u32,
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            effective_type: EffectiveType::FourG,
            save_data: false,
            is_mobile: false,
            downlink_mbps: 10.0,
            rtt_ms: 100,
        }
    }
}

impl ConnectionProfile {
    pub fn desktop() -> Self {
        Self::default()
    }

    pub fn mobile() -> Self {
        Self {
            is_mobile: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_effective_type(mut self, effective_type: EffectiveType) -> Self {
        self.effective_type = effective_type;
        self
    }

    #[must_use]
    pub fn with_save_data(mut self, save_data: bool) -> Self {
        self.save_data = save_data;
        self
    }

    /// Derive the device class from the layout viewport width.
    #[must_use]
    pub fn with_viewport_width(mut self, width_px: u32) -> Self {
        self.is_mobile = width_px < MOBILE_BREAKPOINT_PX;
        self
    }

    /// `slow-2g`, `2g` or save-data: defer work until content is close.
    pub fn is_constrained(&self) -> bool {
        self.save_data || self.effective_type.is_slow()
    }

    /// Whether full-quality media is worth fetching ahead of need.
    pub fn prefers_high_quality(&self) -> bool {
        !self.is_constrained()
    }
}

/// Source of fresh [`ConnectionProfile`] samples.
pub trait ConnectionSource: Send + Sync {
    fn sample(&self) -> ConnectionProfile;
}

impl<F> ConnectionSource for F
where
    F: Fn() -> ConnectionProfile + Send + Sync,
{
    fn sample(&self) -> ConnectionProfile {
        self()
    }
}

/// Fixed profile that can be swapped at runtime (e.g. from host `change` notifications).
#[derive(Debug, Default)]
pub struct StaticConnection {
    profile: parking_lot::RwLock<ConnectionProfile>,
}

impl StaticConnection {
    pub fn new(profile: ConnectionProfile) -> Self {
        Self {
            profile: parking_lot::RwLock::new(profile),
        }
    }

    pub fn set(&self, profile: ConnectionProfile) {
        *self.profile.write() = profile;
    }
}

impl ConnectionSource for StaticConnection {
    fn sample(&self) -> ConnectionProfile {
        *self.profile.read()
    }
}

/// Format support advertised by the requesting client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientCapabilities {
    /// Client decodes the modern (WebP) image format.
    pub modern_image: bool,
}

impl ClientCapabilities {
    pub fn modern() -> Self {
        Self { modern_image: true }
    }

    /// Detect support from an HTTP `Accept` header.
    pub fn from_accept(accept: &str) -> Self {
        let modern_image = accept.split(',').any(|part| {
            let mut params = part.split(';');
            let media = params.next().unwrap_or_default().trim();
            let refused = params.any(|p| {
                let p = p.trim();
                p == "q=0" || p == "q=0.0" || p == "q=0.00" || p == "q=0.000"
            });
            media.eq_ignore_ascii_case("image/webp") && !refused
        });
        Self { modern_image }
    }
}
