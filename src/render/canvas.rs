use image::{Rgb, RgbImage, RgbaImage};
use nalgebra::Point2;

use super::Color;

/// フレーム1枚分のラスタ (0RGB u32)
///
/// 描画プリミティブは全て境界チェック付き。はみ出した部分は捨てる。
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl Canvas {
    /// 背景色で塗りつぶしたキャンバスを作成
    pub fn new(width: usize, height: usize, background: Color) -> Self {
        Self {
            buffer: vec![background.0; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// minifbにそのまま渡せる 0RGB バッファ
    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if self.contains(x, y) {
            Some(Color(self.buffer[y as usize * self.width + x as usize]))
        } else {
            None
        }
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height
    }

    /// ピクセルをセット（境界チェック付き）
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if self.contains(x, y) {
            self.buffer[y as usize * self.width + x as usize] = color.0;
        }
    }

    /// Bresenhamのアルゴリズムで線を描画。width > 1 は各点を正方形で太らせる。
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color, width: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let w = width.max(1) as i32;
        let lo = -((w - 1) / 2);
        let hi = w / 2;

        let mut x = x0;
        let mut y = y0;

        loop {
            for oy in lo..=hi {
                for ox in lo..=hi {
                    self.set_pixel(x + ox, y + oy, color);
                }
            }

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// 円を描画（塗りつぶし）
    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: Color) {
        let r2 = radius as i64 * radius as i64;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if (dx as i64).pow(2) + (dy as i64).pow(2) <= r2 {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// 一定間隔の縦横グリッド線
    pub fn draw_grid(&mut self, interval: usize, color: Color) {
        if interval == 0 {
            return;
        }
        let (w, h) = (self.width as i32, self.height as i32);
        for x in (0..self.width).step_by(interval) {
            self.draw_line(x as i32, 0, x as i32, h - 1, color, 1);
        }
        for y in (0..self.height).step_by(interval) {
            self.draw_line(0, y as i32, w - 1, y as i32, color, 1);
        }
    }

    /// RGBA画像を center を中心にアルファ合成で貼り付け
    pub fn blit(&mut self, image: &RgbaImage, center: Point2<f64>) {
        let left = (center.x - image.width() as f64 / 2.0).round() as i64;
        let top = (center.y - image.height() as f64 / 2.0).round() as i64;

        for (sx, sy, px) in image.enumerate_pixels() {
            let alpha = px[3] as u32;
            if alpha == 0 {
                continue;
            }
            let x = left + sx as i64;
            let y = top + sy as i64;
            if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                continue;
            }
            let idx = y as usize * self.width + x as usize;
            let dst = Color(self.buffer[idx]);
            let blend = |s: u8, d: u8| -> u32 {
                (s as u32 * alpha + d as u32 * (255 - alpha) + 127) / 255
            };
            self.buffer[idx] = (blend(px[0], dst.r()) << 16)
                | (blend(px[1], dst.g()) << 8)
                | blend(px[2], dst.b());
        }
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let c = Color(self.buffer[y as usize * self.width + x as usize]);
            Rgb([c.r(), c.g(), c.b()])
        })
    }

    /// OpenCV向けの BGR バイト列（行優先）
    pub fn to_bgr_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.buffer.len() * 3);
        for &v in &self.buffer {
            let c = Color(v);
            out.extend_from_slice(&[c.b(), c.g(), c.r()]);
        }
        out
    }
}
