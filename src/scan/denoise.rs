//! Non-local-means denoising
//!
//! Classic NL-means on a single-channel image: each output pixel is a
//! weighted average of every pixel in a search window around it, where the
//! weight decays with the squared distance between the two pixels'
//! surrounding patches. Grain averages away because flat regions match
//! each other; text strokes survive because their patches only match other
//! stroke pixels.
//!
//! Rows are independent, so they are processed in parallel.

use image::{GrayImage, Luma};
use rayon::prelude::*;

/// Denoise a grayscale image.
///
/// `h` is the filtering strength, `patch_radius` the template half-width
/// (3 gives a 7x7 patch), `search_radius` the search window half-width
/// (10 gives a 21x21 window). Patch comparisons clamp at the image border.
pub fn nl_means(image: &GrayImage, h: f32, patch_radius: u32, search_radius: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let h2 = (h * h).max(f32::EPSILON);

    let rows: Vec<Vec<u8>> = (0..height)
        .into_par_iter()
        .map(|y| {
            (0..width)
                .map(|x| denoise_pixel(image, x, y, h2, patch_radius, search_radius))
                .collect()
        })
        .collect();

    let mut out = GrayImage::new(width, height);
    for (y, row) in rows.into_iter().enumerate() {
        for (x, value) in row.into_iter().enumerate() {
            out.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }
    out
}

fn denoise_pixel(
    image: &GrayImage,
    x: u32,
    y: u32,
    h2: f32,
    patch_radius: u32,
    search_radius: u32,
) -> u8 {
    let (width, height) = image.dimensions();
    let r = search_radius as i64;

    let x_min = (x as i64 - r).max(0) as u32;
    let x_max = (x as i64 + r).min(width as i64 - 1) as u32;
    let y_min = (y as i64 - r).max(0) as u32;
    let y_max = (y as i64 + r).min(height as i64 - 1) as u32;

    let mut weight_sum = 0.0f32;
    let mut value_sum = 0.0f32;

    for qy in y_min..=y_max {
        for qx in x_min..=x_max {
            let d2 = patch_distance(image, x, y, qx, qy, patch_radius);
            let weight = (-d2 / h2).exp();
            weight_sum += weight;
            value_sum += weight * image.get_pixel(qx, qy).0[0] as f32;
        }
    }

    (value_sum / weight_sum).round().clamp(0.0, 255.0) as u8
}

/// Mean squared difference between the patches centered on (px, py) and
/// (qx, qy), with coordinates clamped at the border.
fn patch_distance(image: &GrayImage, px: u32, py: u32, qx: u32, qy: u32, radius: u32) -> f32 {
    let (width, height) = image.dimensions();
    let r = radius as i64;
    let clamp_x = |v: i64| v.clamp(0, width as i64 - 1) as u32;
    let clamp_y = |v: i64| v.clamp(0, height as i64 - 1) as u32;

    let mut sum = 0.0f32;
    let mut count = 0u32;
    for dy in -r..=r {
        for dx in -r..=r {
            let a = image
                .get_pixel(clamp_x(px as i64 + dx), clamp_y(py as i64 + dy))
                .0[0] as f32;
            let b = image
                .get_pixel(clamp_x(qx as i64 + dx), clamp_y(qy as i64 + dy))
                .0[0] as f32;
            let diff = a - b;
            sum += diff * diff;
            count += 1;
        }
    }
    sum / count as f32
}

// ============================================================
// Tests
// ============================================================
