//! Ratio grid overlay.
//!
//! Lines every 1/20 of the screen (red every fifth), labelled with their
//! ratio coordinates so the model can answer in the grammar's `x, y` form.
use image::{Rgba, RgbaImage};

pub const GRID_DIVISIONS: u32 = 20;
const MAJOR_EVERY: u32 = 5;

const MAJOR_LINE: [u8; 4] = [255, 0, 0, 180];
const MINOR_LINE: [u8; 4] = [255, 100, 100, 120];
const CROSSHAIR: [u8; 4] = [0, 255, 0, 200];
const LABEL_BG: [u8; 4] = [255, 255, 255, 220];
const LABEL_FG: [u8; 4] = [0, 0, 0, 255];
const CROSSHAIR_ARM: i64 = 3;

// 3×5 glyphs, bit 2 is the leftmost column.
const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

fn glyph(c: char) -> Option<[u8; 5]> {
    Some(match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        _ => return None,
    })
}

/// Label printed at grid intersection (i, j), e.g. `(0.25,0.50)`.
pub fn ratio_label(i: u32, j: u32, divisions: u32) -> String {
    let n = divisions.max(1) as f64;
    format!("({:.2},{:.2})", i as f64 / n, j as f64 / n)
}

fn blend(canvas: &mut RgbaImage, x: i64, y: i64, [r, g, b, a]: [u8; 4]) {
    let (w, h) = canvas.dimensions();
    if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
        return;
    }
    let Rgba(px) = canvas.get_pixel_mut(x as u32, y as u32);
    let alpha = a as f32 / 255.0;
    for (c, src) in px.iter_mut().zip([r, g, b]) {
        *c = (*c as f32 * (1.0 - alpha) + src as f32 * alpha).round() as u8;
    }
}

fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: [u8; 4]) {
    for dy in 0..h as i64 {
        for dx in 0..w as i64 {
            blend(canvas, x + dx, y + dy, color);
        }
    }
}

fn draw_label(canvas: &mut RgbaImage, text: &str, x: i64, y: i64, scale: u32) {
    let advance = (GLYPH_W + 1) * scale;
    let count = text.chars().count() as u32;
    fill_rect(canvas, x, y, count * advance + scale, GLYPH_H * scale + 2 * scale, LABEL_BG);

    let (ox, oy) = (x + scale as i64, y + scale as i64);
    for (n, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let gx = ox + (n as u32 * advance) as i64;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits >> (GLYPH_W - 1 - col) & 1 == 0 {
                    continue;
                }
                let px = gx + (col * scale) as i64;
                let py = oy + (row as u32 * scale) as i64;
                fill_rect(canvas, px, py, scale, scale, LABEL_FG);
            }
        }
    }
}

/// Draws the grid onto `canvas` in place.
pub fn draw_ratio_grid(canvas: &mut RgbaImage, divisions: u32) {
    let (w, h) = canvas.dimensions();
    let n = divisions.max(1);
    let cell_w = (w / n).max(1) as i64;
    let cell_h = (h / n).max(1) as i64;

    for i in 0..=n {
        let major = i % MAJOR_EVERY == 0;
        let (color, thickness) = if major { (MAJOR_LINE, 2) } else { (MINOR_LINE, 1) };
        let x = i as i64 * cell_w;
        let y = i as i64 * cell_h;
        for t in 0..thickness {
            for yy in 0..h as i64 {
                blend(canvas, x + t, yy, color);
            }
            for xx in 0..w as i64 {
                blend(canvas, xx, y + t, color);
            }
        }
    }

    let scale = if w >= 1280 { 2 } else { 1 };
    for i in (0..=n).step_by(MAJOR_EVERY as usize) {
        for j in (0..=n).step_by(MAJOR_EVERY as usize) {
            let label = ratio_label(i, j, n);
            draw_label(canvas, &label, i as i64 * cell_w + 2, j as i64 * cell_h + 2, scale);
        }
    }

    for i in (1..n).step_by(2) {
        for j in (1..n).step_by(2) {
            let (cx, cy) = (i as i64 * cell_w, j as i64 * cell_h);
            for d in -CROSSHAIR_ARM..=CROSSHAIR_ARM {
                for t in 0..2 {
                    blend(canvas, cx + d, cy + t, CROSSHAIR);
                    blend(canvas, cx + t, cy + d, CROSSHAIR);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn labels_use_two_decimals() {
        assert_eq!(ratio_label(5, 10, 20), "(0.25,0.50)");
        assert_eq!(ratio_label(20, 0, 20), "(1.00,0.00)");
    }

    #[test]
    fn every_label_character_has_a_glyph() {
        for c in ratio_label(15, 5, 20).chars() {
            assert!(glyph(c).is_some(), "{c}");
        }
    }

    #[test]
    fn major_lines_are_stronger_than_minor() {
        let mut img = black(400, 200);
        draw_ratio_grid(&mut img, GRID_DIVISIONS);
        let minor = img.get_pixel(20, 35).0;
        let major = img.get_pixel(100, 35).0;
        let blank = img.get_pixel(25, 35).0;
        assert!(major[0] > minor[0] && minor[0] > 0, "{major:?} {minor:?}");
        assert_eq!(major[1], 0);
        assert_eq!(blank, [0, 0, 0, 255]);
    }

    #[test]
    fn label_background_is_light() {
        let mut img = black(400, 200);
        draw_ratio_grid(&mut img, GRID_DIVISIONS);
        let bg = img.get_pixel(2, 2).0;
        assert!(bg[0] > 200 && bg[1] > 150 && bg[2] > 150, "{bg:?}");
    }

    #[test]
    fn tiny_images_do_not_panic() {
        let mut img = black(3, 2);
        draw_ratio_grid(&mut img, GRID_DIVISIONS);
    }
}
