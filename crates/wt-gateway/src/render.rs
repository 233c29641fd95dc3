use std::io::Cursor;
use image::{ImageFormat, Rgba, RgbaImage};
use wt_core::{ArtStyle, AspectRatio};
use crate::config::MAX_LONG_EDGE;
use crate::error::GatewayError;

/// Placeholder preview standing in for the real image model: a lit disc in
/// the style's palette over a dark gradient, sized for the canvas ratio.
pub fn render_placeholder(style: ArtStyle, aspect_ratio: AspectRatio, long_edge: u32) -> RgbaImage {
    let (width, height) = aspect_ratio.dimensions(long_edge.clamp(3, MAX_LONG_EDGE));
    let base_color = style.palette();
    let mut img = RgbaImage::new(width, height);

    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let radius = width.min(height) as f32 * 0.35;

    // Light comes from the upper left
    let light_x = center_x - radius * 0.5;
    let light_y = center_y - radius * 0.5;

    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - center_x;
            let dy = y as f32 - center_y;
            let dist = (dx * dx + dy * dy).sqrt();

            let pixel = if dist < radius {
                let depth = (1.0 - (dist / radius).powi(2)).sqrt();
                let brightness = depth * 0.7 + 0.3;

                let lx = x as f32 - light_x;
                let ly = y as f32 - light_y;
                let light_dist = (lx * lx + ly * ly).sqrt();
                let light_factor = (1.0 - (light_dist / (radius * 2.0)).min(1.0)) * 0.3 + 0.7;

                let shade = brightness * light_factor;
                Rgba([
                    (base_color[0] as f32 * shade) as u8,
                    (base_color[1] as f32 * shade) as u8,
                    (base_color[2] as f32 * shade) as u8,
                    255,
                ])
            } else {
                let bg = 0.2 + (y as f32 / height as f32) * 0.1;
                Rgba([(50.0 * bg) as u8, (50.0 * bg) as u8, (60.0 * bg) as u8, 255])
            };
            img.put_pixel(x, y, pixel);
        }
    }

    img
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, GatewayError> {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}
