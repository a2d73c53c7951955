use image::{imageops, GrayImage, RgbImage};

/// Grey level a pixel must exceed after equalisation to count as lit.
const HEADLIGHT_LEVEL: u8 = 220;
/// Share of lit pixels in the headlight window that flags an emitter.
const HEADLIGHT_FRACTION: f64 = 0.02;
/// Histogram clip factor, relative to a flat histogram.
const CLIP_LIMIT: f64 = 2.0;

/// Median of the HSV value channel (`max(r, g, b)`) over a frame, 0–255.
///
/// This is the per-frame brightness statistic fed to
/// [`AmbientEstimator::compute`](super::AmbientEstimator::compute). An empty
/// frame yields `None`.
pub fn frame_value_median(frame: &RgbImage) -> Option<f64> {
    let mut hist = [0u64; 256];
    let mut count = 0u64;
    for px in frame.pixels() {
        let [r, g, b] = px.0;
        hist[r.max(g).max(b) as usize] += 1;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    // Even counts average the two middle values.
    let lower = value_at_rank(&hist, (count - 1) / 2);
    let upper = value_at_rank(&hist, count / 2);
    Some((lower as f64 + upper as f64) * 0.5)
}

fn value_at_rank(hist: &[u64; 256], rank: u64) -> u8 {
    let mut seen = 0u64;
    for (value, &n) in hist.iter().enumerate() {
        seen += n;
        if seen > rank {
            return value as u8;
        }
    }
    u8::MAX
}

/// Whether the lower-centre band of a vehicle box shows lit headlights.
///
/// The window spans 35–65 % of the box width and its lower 35 %, clipped to
/// the frame. The grey window is equalised with a clip limit and flagged when
/// more than 2 % of its pixels end above level 220. Boxes that leave no
/// window inside the frame are never flagged.
pub fn estimate_headlights(frame: &RgbImage, bbox: [f64; 4]) -> bool {
    let Some((x, y, w, h)) = headlight_window(frame.dimensions(), bbox) else {
        return false;
    };
    let roi = imageops::crop_imm(frame, x, y, w, h).to_image();
    let gray = equalize_clipped(&imageops::grayscale(&roi), CLIP_LIMIT);
    let lit = gray.pixels().filter(|p| p.0[0] > HEADLIGHT_LEVEL).count();
    lit as f64 / (w as f64 * h as f64) > HEADLIGHT_FRACTION
}

/// `(x, y, width, height)` of the headlight window, or `None` when empty.
fn headlight_window((width, height): (u32, u32), bbox: [f64; 4]) -> Option<(u32, u32, u32, u32)> {
    if !bbox.iter().all(|v| v.is_finite()) {
        return None;
    }
    let [x1, y1, x2, y2] = bbox.map(|v| v.trunc() as i64);
    let (bw, bh) = (x2 - x1, y2 - y1);
    let clamp_x = |v: i64| v.clamp(0, width as i64);
    let clamp_y = |v: i64| v.clamp(0, height as i64);
    let xs = clamp_x(x1 + (0.35 * bw as f64) as i64);
    let xe = clamp_x(x1 + (0.65 * bw as f64) as i64);
    let ys = clamp_y(y1 + (0.65 * bh as f64) as i64);
    let ye = clamp_y(y2);
    if xe <= xs || ye <= ys {
        return None;
    }
    Some((xs as u32, ys as u32, (xe - xs) as u32, (ye - ys) as u32))
}

/// Histogram equalisation over the whole image with each bin capped at
/// `clip` times the flat-histogram height; the clipped excess is spread
/// evenly over all bins.
fn equalize_clipped(gray: &GrayImage, clip: f64) -> GrayImage {
    let mut hist = [0u64; 256];
    for p in gray.pixels() {
        hist[p.0[0] as usize] += 1;
    }
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return gray.clone();
    }

    let limit = ((clip * total as f64 / 256.0) as u64).max(1);
    let mut excess = 0u64;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let bonus = excess / 256;
    let residual = (excess % 256) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += bonus + u64::from(i < residual);
    }

    let scale = 255.0 / total as f64;
    let mut lut = [0u8; 256];
    let mut cdf = 0u64;
    for (level, &n) in hist.iter().enumerate() {
        cdf += n;
        lut[level] = (cdf as f64 * scale).round().min(255.0) as u8;
    }
    let mut out = gray.clone();
    for p in out.pixels_mut() {
        p.0[0] = lut[p.0[0] as usize];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn median_uses_brightest_channel() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([10, 200, 30]));
        img.put_pixel(1, 0, Rgb([50, 40, 30]));
        img.put_pixel(2, 0, Rgb([0, 0, 90]));
        assert_eq!(frame_value_median(&img), Some(90.0));
    }

    #[test]
    fn even_pixel_count_averages_middle_pair() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([100, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 201]));
        assert_eq!(frame_value_median(&img), Some(150.5));
    }

    #[test]
    fn empty_frame_has_no_statistic() {
        assert_eq!(frame_value_median(&RgbImage::new(0, 0)), None);
    }

    /// Dark 200x200 street with a car box at [50, 50, 150, 150]; its
    /// headlight window is x 85..115, y 115..150.
    fn night_frame() -> RgbImage {
        RgbImage::from_pixel(200, 200, Rgb([30, 30, 30]))
    }

    fn paint(frame: &mut RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) {
        for y in ys {
            for x in xs.clone() {
                frame.put_pixel(x, y, Rgb([250, 250, 240]));
            }
        }
    }

    const CAR: [f64; 4] = [50.0, 50.0, 150.0, 150.0];

    #[test]
    fn bright_patch_low_in_the_box_reads_as_headlights() {
        let mut frame = night_frame();
        paint(&mut frame, 90..110, 125..145);
        assert!(estimate_headlights(&frame, CAR));
    }

    #[test]
    fn flat_dark_window_is_not_stretched_into_headlights() {
        assert!(!estimate_headlights(&night_frame(), CAR));
        let grey = RgbImage::from_pixel(200, 200, Rgb([180, 180, 180]));
        assert!(!estimate_headlights(&grey, CAR));
    }

    #[test]
    fn light_above_the_window_is_ignored() {
        let mut frame = night_frame();
        // Windscreen reflection in the upper half of the box.
        paint(&mut frame, 90..110, 60..90);
        assert!(!estimate_headlights(&frame, CAR));
    }

    #[test]
    fn boxes_without_a_window_in_frame_are_never_flagged() {
        let mut frame = night_frame();
        paint(&mut frame, 0..200, 0..200);
        assert!(!estimate_headlights(&frame, [300.0, 300.0, 400.0, 400.0]));
        assert!(!estimate_headlights(&frame, [60.0, 60.0, 61.0, 61.0]));
        assert!(!estimate_headlights(&frame, [f64::NAN, 0.0, 10.0, 10.0]));
        assert!(!estimate_headlights(&RgbImage::new(0, 0), CAR));
    }

    #[test]
    fn window_is_clipped_to_the_frame() {
        assert_eq!(headlight_window((200, 200), CAR), Some((85, 115, 30, 35)));
        assert_eq!(
            headlight_window((120, 140), CAR),
            Some((85, 115, 30, 25))
        );
    }
}
