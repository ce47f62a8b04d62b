//! Global volume setting and the backgrounding gate.

/// Perceptual curve applied to the global volume setting: `1 - (1 - v)^2`.
pub fn perceptual_factor(volume: f32) -> f32 {
    let inverse = 1.0 - volume;
    1.0 - inverse * inverse
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GlobalVolume {
    setting: f32,
    visible: bool,
}

impl GlobalVolume {
    pub(crate) fn new(setting: f32) -> Self {
        let mut volume = Self {
            setting: 1.0,
            visible: true,
        };
        volume.set_setting(setting);
        volume
    }

    pub(crate) fn setting(&self) -> f32 {
        self.setting
    }

    pub(crate) fn set_setting(&mut self, setting: f32) {
        self.setting = if setting.is_finite() {
            setting.clamp(0.0, 1.0)
        } else {
            1.0
        };
    }

    pub(crate) fn visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Multiplier applied on top of every instance's effective volume.
    pub(crate) fn factor(&self) -> f32 {
        if self.visible {
            perceptual_factor(self.setting)
        } else {
            0.0
        }
    }
}
