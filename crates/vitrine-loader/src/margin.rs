use vitrine_core::{ConnectionProfile, MediaKind};

use crate::props::PreviewMode;

/// Root margins (px) by device class and connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarginPolicy {
    /// `slow-2g`, `2g` or save-data.
    pub constrained_px: u32,
    pub mobile_px: u32,
    pub desktop_px: u32,
    pub mobile_preview_px: u32,
    pub desktop_preview_px: u32,
    pub video_px: u32,
    pub video_preview_px: u32,
}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self {
            constrained_px: 100,
            mobile_px: 400,
            desktop_px: 200,
            mobile_preview_px: 500,
            desktop_preview_px: 300,
            video_px: 100,
            video_preview_px: 200,
        }
    }
}

impl MarginPolicy {
    /// Margin for one observation, decided from a freshly sampled `profile`.
    pub fn root_margin(
        &self,
        profile: &ConnectionProfile,
        preview: PreviewMode,
        kind: MediaKind,
    ) -> u32 {
        if kind == MediaKind::Video {
            return if preview.is_on() {
                self.video_preview_px
            } else {
                self.video_px
            };
        }

        if profile.is_constrained() {
            return self.constrained_px;
        }

        match (profile.is_mobile, preview.is_on()) {
            (true, true) => self.mobile_preview_px,
            (true, false) => self.mobile_px,
            (false, true) => self.desktop_preview_px,
            (false, false) => self.desktop_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use vitrine_core::EffectiveType;

    use super::*;

    fn mobile(et: EffectiveType) -> ConnectionProfile {
        ConnectionProfile::mobile().with_effective_type(et)
    }

    #[rstest]
    #[case(mobile(EffectiveType::FourG), PreviewMode::Off, 400)]
    #[case(mobile(EffectiveType::ThreeG), PreviewMode::Off, 400)]
    #[case(mobile(EffectiveType::TwoG), PreviewMode::Off, 100)]
    #[case(mobile(EffectiveType::Slow2g), PreviewMode::Progressive, 100)]
    #[case(mobile(EffectiveType::FourG).with_save_data(true), PreviewMode::Off, 100)]
    #[case(mobile(EffectiveType::FourG), PreviewMode::Progressive, 500)]
    #[case(ConnectionProfile::desktop(), PreviewMode::Off, 200)]
    #[case(ConnectionProfile::desktop(), PreviewMode::Progressive, 300)]
    #[case(ConnectionProfile::desktop().with_save_data(true), PreviewMode::Off, 100)]
    fn image_margins(
        #[case] profile: ConnectionProfile,
        #[case] preview: PreviewMode,
        #[case] expected: u32,
    ) {
        let margin = MarginPolicy::default().root_margin(&profile, preview, MediaKind::Image);
        assert_eq!(margin, expected);
    }

    #[rstest]
    #[case(PreviewMode::Off, 100)]
    #[case(PreviewMode::Progressive, 200)]
    fn video_margins_ignore_connection(#[case] preview: PreviewMode, #[case] expected: u32) {
        let policy = MarginPolicy::default();
        for profile in [
            ConnectionProfile::desktop(),
            mobile(EffectiveType::TwoG),
            mobile(EffectiveType::FourG),
        ] {
            assert_eq!(policy.root_margin(&profile, preview, MediaKind::Video), expected);
        }
    }
}
