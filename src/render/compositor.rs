use nalgebra::Point2;

use crate::config::RenderConfig;
use crate::kinematics::FrameGeometry;

use super::skeleton::BONE_CONNECTIONS;
use super::sprite::SpriteSet;
use super::{Canvas, Color};

/// 描画オプション
#[derive(Debug, Clone)]
pub struct Style {
    pub width: usize,
    pub height: usize,
    pub background: Color,
    pub show_grid: bool,
    pub grid_interval: usize,
    pub grid_color: Color,
    /// 関節マーカーと骨線
    pub overlay: bool,
    pub joint_color: Color,
    pub joint_radius: i32,
    pub bone_color: Color,
    pub bone_width: u32,
}

impl Style {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            background: config.background,
            show_grid: config.show_grid,
            grid_interval: config.grid_interval,
            grid_color: config.grid_color,
            overlay: config.overlay,
            joint_color: config.joint_color,
            joint_radius: config.joint_radius,
            bone_color: config.bone_color,
            bone_width: config.bone_width,
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

/// FrameGeometry + スプライト → 1フレームのラスタ
pub struct Compositor {
    style: Style,
    sprites: SpriteSet,
}

fn to_pixel(p: Point2<f64>) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

impl Compositor {
    pub fn new(style: Style, sprites: SpriteSet) -> Self {
        Self { style, sprites }
    }

    /// 1フレームを合成
    ///
    /// 背景 → グリッド → 腰・膝・足のスプライト → オーバーレイ の順。
    /// 回転済み画像はこの呼び出しの中で破棄される。
    pub fn compose(&self, geometry: &FrameGeometry) -> Canvas {
        let style = &self.style;
        let mut canvas = Canvas::new(style.width, style.height, style.background);

        if style.show_grid {
            canvas.draw_grid(style.grid_interval, style.grid_color);
        }

        for (role, start, end, angle) in geometry.segments() {
            let rotated = self.sprites.get(role).rotated(angle);
            canvas.blit(&rotated, nalgebra::center(&start, &end));
        }

        if style.overlay {
            self.draw_overlay(&mut canvas, geometry);
        }

        canvas
    }

    fn draw_overlay(&self, canvas: &mut Canvas, geometry: &FrameGeometry) {
        let style = &self.style;
        let joints = geometry.joints();

        for joint in joints.iter() {
            let (x, y) = to_pixel(*joint);
            canvas.draw_circle(x, y, style.joint_radius, style.joint_color);
        }

        for (start, end) in BONE_CONNECTIONS.iter() {
            let (x0, y0) = to_pixel(joints[*start as usize]);
            let (x1, y1) = to_pixel(joints[*end as usize]);
            canvas.draw_line(x0, y0, x1, y1, style.bone_color, style.bone_width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::{solve, SegmentLengths};
    use crate::render::{FillRatios, SegmentRole};
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn transparent_sprites(lengths: &SegmentLengths) -> SpriteSet {
        let clear = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        SpriteSet::from_images([clear.clone(), clear.clone(), clear], lengths, &FillRatios::default())
    }

    fn small_style() -> Style {
        Style {
            width: 200,
            height: 200,
            show_grid: false,
            ..Style::default()
        }
    }

    #[test]
    fn test_background_only() {
        let lengths = SegmentLengths::new(50.0, 50.0, 20.0);
        let compositor = Compositor::new(small_style(), transparent_sprites(&lengths));
        let g = solve(Point2::new(100.0, 20.0), lengths, 0.0, 100.0, 85.0);
        let canvas = compositor.compose(&g);
        assert_eq!((canvas.width(), canvas.height()), (200, 200));
        assert!(canvas.buffer().iter().all(|&p| p == Color::WHITE.0));
    }

    #[test]
    fn test_overlay_marks_joints() {
        let lengths = SegmentLengths::new(50.0, 50.0, 20.0);
        let style = Style {
            overlay: true,
            ..small_style()
        };
        let compositor = Compositor::new(style, transparent_sprites(&lengths));
        let g = solve(Point2::new(100.0, 20.0), lengths, 0.0, 100.0, 85.0);
        let canvas = compositor.compose(&g);

        // 腰マーカーの外周は骨線に覆われない
        assert_eq!(canvas.pixel(95, 20), Some(Color::BLACK));
        // 腰→膝の骨線の中点
        let mid = g.segment_center(SegmentRole::Hip);
        let (mx, my) = to_pixel(mid);
        assert_eq!(canvas.pixel(mx, my), Some(Color::BLUE));
    }

    #[test]
    fn test_grid_drawn_when_enabled() {
        let lengths = SegmentLengths::new(50.0, 50.0, 20.0);
        let style = Style {
            show_grid: true,
            ..small_style()
        };
        let compositor = Compositor::new(style, transparent_sprites(&lengths));
        let g = solve(Point2::new(100.0, 20.0), lengths, 0.0, 100.0, 85.0);
        let canvas = compositor.compose(&g);
        assert_eq!(canvas.pixel(50, 7), Some(Color::LIGHT_GRAY));
        assert_eq!(canvas.pixel(7, 150), Some(Color::LIGHT_GRAY));
    }

    #[test]
    fn test_sprite_centered_on_segment() {
        let lengths = SegmentLengths::new(40.0, 40.0, 10.0);
        let ratios = FillRatios { hip: 0.5, knee: 0.5, foot: 0.5 };
        let solid = RgbaImage::from_pixel(2, 8, RED);
        let clear = RgbaImage::from_pixel(2, 8, Rgba([0, 0, 0, 0]));
        let sprites = SpriteSet::from_images([solid, clear.clone(), clear], &lengths, &ratios);
        let compositor = Compositor::new(small_style(), sprites);

        // θh=0 → 腰セグメントは真下向き (hip_angle = -90)
        let g = solve(Point2::new(100.0, 20.0), lengths, 0.0, 0.0, 0.0);
        let canvas = compositor.compose(&g);
        let (cx, cy) = to_pixel(g.segment_center(SegmentRole::Hip));
        assert_eq!(canvas.pixel(cx, cy), Some(Color::RED));
        assert_eq!(canvas.pixel(cx + 40, cy), Some(Color::WHITE));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let lengths = SegmentLengths::new(60.0, 60.0, 20.0);
        let images = [
            RgbaImage::from_pixel(6, 20, RED),
            RgbaImage::from_pixel(6, 20, RED),
            RgbaImage::from_pixel(20, 6, RED),
        ];
        let sprites = SpriteSet::from_images(images, &lengths, &FillRatios::default());
        let compositor = Compositor::new(
            Style {
                overlay: true,
                ..small_style()
            },
            sprites,
        );
        let g = solve(Point2::new(100.0, 30.0), lengths, 12.0, 120.0, 95.0);
        assert_eq!(compositor.compose(&g), compositor.compose(&g));
    }
}
