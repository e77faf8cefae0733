use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};

/// Per-image adjustments
///
/// Every field has a neutral default and a missing key in a project file
/// means "neutral". Applying `FilterParams::default()` leaves pixels
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterParams {
    /// Clockwise rotation applied before anything else
    #[serde(alias = "rotate")]
    pub rotation: Rotation,

    /// Brightness factor (1.0 = unchanged, 0.0 = black)
    pub brightness: f32,

    /// Contrast factor (1.0 = unchanged, 0.0 = flat mean gray)
    pub contrast: f32,

    /// Saturation factor (1.0 = unchanged, 0.0 = grayscale)
    pub saturation: f32,

    /// Sharpness factor (1.0 = unchanged, 0.0 = smoothed)
    pub sharpness: f32,

    /// Gaussian blur radius in pixels (0 = off)
    pub blur: f32,

    pub grayscale: bool,
    pub invert: bool,
    pub sepia: bool,
    pub emboss: bool,
    pub contour: bool,
    pub detail: bool,
    pub edge_enhance: bool,

    /// Bits kept per channel (1-8), `None` disables posterize
    pub posterize: Option<u8>,

    /// Values at or above this threshold (0-255) are inverted, `None` disables solarize
    pub solarize: Option<u16>,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            rotation: Rotation::None,
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            sharpness: 1.0,
            blur: 0.0,
            grayscale: false,
            invert: false,
            sepia: false,
            emboss: false,
            contour: false,
            detail: false,
            edge_enhance: false,
            posterize: None,
            solarize: None,
        }
    }
}

impl FilterParams {
    /// True when applying these parameters cannot change any pixel
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Range checks for every field. Out-of-range values are rejected,
    /// never clamped.
    pub fn validate(&self) -> Result<()> {
        let factors = [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
            ("sharpness", self.sharpness),
            ("blur", self.blur),
        ];

        for (name, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(ReelError::invalid(
                    format!("filters.{}", name),
                    format!("must be a finite value >= 0, got {}", value),
                ));
            }
        }

        if let Some(bits) = self.posterize {
            if !(1..=8).contains(&bits) {
                return Err(ReelError::invalid(
                    "filters.posterize",
                    format!("bits must be 1-8, got {}", bits),
                ));
            }
        }

        if let Some(threshold) = self.solarize {
            if threshold > 255 {
                return Err(ReelError::invalid(
                    "filters.solarize",
                    format!("threshold must be 0-255, got {}", threshold),
                ));
            }
        }

        Ok(())
    }
}

/// Clockwise quarter-turn rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> std::result::Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Cw90),
            180 => Ok(Rotation::Cw180),
            270 => Ok(Rotation::Cw270),
            other => Err(format!("rotation must be 0, 90, 180 or 270, got {}", other)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity_and_valid() {
        let params = FilterParams::default();
        assert!(params.is_identity());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_missing_keys_take_neutral_defaults() {
        let params: FilterParams = toml::from_str("sepia = true\nrotate = 90\n").unwrap();
        assert!(params.sepia);
        assert_eq!(params.rotation, Rotation::Cw90);
        assert_eq!(params.brightness, 1.0);
        assert_eq!(params.posterize, None);
    }

    #[test]
    fn test_bad_rotation_fails_to_parse() {
        let result: std::result::Result<FilterParams, _> = toml::from_str("rotation = 45\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_posterize_bits_out_of_range() {
        for bits in [0u8, 9] {
            let params = FilterParams { posterize: Some(bits), ..Default::default() };
            match params.validate() {
                Err(ReelError::InvalidParameter { context, .. }) => {
                    assert_eq!(context, "filters.posterize");
                }
                other => panic!("expected InvalidParameter, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_solarize_threshold_out_of_range() {
        let params = FilterParams { solarize: Some(256), ..Default::default() };
        assert!(params.validate().is_err());
        let params = FilterParams { solarize: Some(255), ..Default::default() };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_negative_and_nan_factors_rejected() {
        let params = FilterParams { contrast: -0.1, ..Default::default() };
        assert!(params.validate().is_err());
        let params = FilterParams { blur: f32::NAN, ..Default::default() };
        assert!(params.validate().is_err());
    }
}
