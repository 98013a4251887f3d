use eframe::egui::{Color32, ColorImage};

use crate::series::Frame;
use crate::windowing::{GrayFrame, Windowed};

pub fn to_color_image(image: &Windowed) -> ColorImage {
    match image {
        Windowed::Gray(gray) => render_gray(gray),
        Windowed::Original(frame) => render_autoscaled(frame),
    }
}

fn render_gray(gray: &GrayFrame) -> ColorImage {
    ColorImage {
        size: [gray.width, gray.height],
        pixels: gray.pixels.iter().copied().map(Color32::from_gray).collect(),
    }
}

/// Paints original intensities by stretching the frame's own min..max to
/// black..white. The core values are left as they are.
fn render_autoscaled(frame: &Frame) -> ColorImage {
    let (min_value, max_value) = frame.min_max().unwrap_or((0, 0));
    let low = min_value as f32;
    let range = ((max_value as i64 - min_value as i64) as f32).max(1e-6);

    let mut pixels = Vec::with_capacity(frame.pixels().len());
    for &sample in frame.pixels() {
        let normalized = ((sample as f32 - low) / range).clamp(0.0, 1.0);
        pixels.push(Color32::from_gray((normalized * 255.0).round() as u8));
    }

    ColorImage {
        size: [frame.width(), frame.height()],
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_frames_paint_as_is() {
        let image = to_color_image(&Windowed::Gray(GrayFrame {
            width: 2,
            height: 1,
            pixels: vec![0, 200],
        }));
        assert_eq!(image.size, [2, 1]);
        assert_eq!(image.pixels, vec![Color32::from_gray(0), Color32::from_gray(200)]);
    }

    #[test]
    fn original_frames_stretch_to_their_range() {
        let frame = Frame::new(3, 1, vec![-1000, 0, 1000]).expect("frame");
        let image = to_color_image(&Windowed::Original(frame));
        assert_eq!(
            image.pixels,
            vec![
                Color32::from_gray(0),
                Color32::from_gray(128),
                Color32::from_gray(255)
            ]
        );
    }

    #[test]
    fn flat_original_frames_do_not_divide_by_zero() {
        let frame = Frame::new(2, 1, vec![7, 7]).expect("frame");
        let image = to_color_image(&Windowed::Original(frame));
        assert_eq!(image.pixels, vec![Color32::from_gray(0); 2]);
    }
}
