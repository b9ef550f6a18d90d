// SPDX-License-Identifier: MPL-2.0

//! Parametric colour adjustments on RGB images
//!
//! Adjustments are applied per pixel in the order they are given. Callers pass
//! [`Adjustments::ordered`](crate::filters::Adjustments::ordered), which fixes the
//! order to brightness, contrast, saturation, temperature. Every step clamps to
//! the displayable range before the next one runs.

use crate::filters::Adjustment;
use image::RgbImage;

/// Red/blue shift in 8-bit levels for a temperature of 1.0
const TEMPERATURE_SHIFT: f32 = 40.0;

/// Apply `adjustments` to every pixel of `image`
pub fn apply_adjustments(image: &mut RgbImage, adjustments: &[Adjustment]) {
    if adjustments.is_empty() {
        return;
    }

    for pixel in image.pixels_mut() {
        let mut rgb = [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32];

        for adjustment in adjustments {
            rgb = apply_one(rgb, *adjustment);
        }

        pixel[0] = rgb[0].round() as u8;
        pixel[1] = rgb[1].round() as u8;
        pixel[2] = rgb[2].round() as u8;
    }
}

fn apply_one([r, g, b]: [f32; 3], adjustment: Adjustment) -> [f32; 3] {
    let out = match adjustment {
        Adjustment::Brightness(amount) => {
            let offset = amount * 255.0;
            [r + offset, g + offset, b + offset]
        }
        Adjustment::Contrast(factor) => [
            (r - 128.0) * factor + 128.0,
            (g - 128.0) * factor + 128.0,
            (b - 128.0) * factor + 128.0,
        ],
        Adjustment::Saturation(factor) => {
            let gray = 0.299 * r + 0.587 * g + 0.114 * b;
            [
                gray + (r - gray) * factor,
                gray + (g - gray) * factor,
                gray + (b - gray) * factor,
            ]
        }
        Adjustment::Temperature(amount) => {
            let shift = amount * TEMPERATURE_SHIFT;
            [r + shift, g, b - shift]
        }
    };

    out.map(|c| c.clamp(0.0, 255.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(4, 4, Rgb(rgb))
    }

    #[test]
    fn empty_adjustments_leave_image_untouched() {
        let mut image = solid([10, 120, 240]);
        apply_adjustments(&mut image, &[]);
        assert_eq!(image.get_pixel(0, 0), &Rgb([10, 120, 240]));
    }

    #[test]
    fn zero_saturation_produces_greyscale() {
        let mut image = solid([200, 100, 50]);
        apply_adjustments(&mut image, &[Adjustment::Saturation(0.0)]);
        let p = image.get_pixel(2, 2);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }

    #[test]
    fn brightness_clamps_at_white() {
        let mut image = solid([250, 250, 250]);
        apply_adjustments(&mut image, &[Adjustment::Brightness(0.5)]);
        assert_eq!(image.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn warm_temperature_raises_red_and_lowers_blue() {
        let mut image = solid([100, 100, 100]);
        apply_adjustments(&mut image, &[Adjustment::Temperature(0.5)]);
        assert_eq!(image.get_pixel(0, 0), &Rgb([120, 100, 80]));
    }

    #[test]
    fn order_matters_between_brightness_and_contrast() {
        let mut brighten_first = solid([100, 100, 100]);
        apply_adjustments(
            &mut brighten_first,
            &[Adjustment::Brightness(0.2), Adjustment::Contrast(2.0)],
        );

        let mut contrast_first = solid([100, 100, 100]);
        apply_adjustments(
            &mut contrast_first,
            &[Adjustment::Contrast(2.0), Adjustment::Brightness(0.2)],
        );

        // (100 + 51 - 128) * 2 + 128 = 174 vs (100 - 128) * 2 + 128 + 51 = 123
        assert_eq!(brighten_first.get_pixel(0, 0)[0], 174);
        assert_eq!(contrast_first.get_pixel(0, 0)[0], 123);
    }
}
