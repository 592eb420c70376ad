use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::AssetConfig;
use crate::error::{GaitError, Result};
use crate::kinematics::SegmentLengths;

/// 脚の3セグメント。Hip は腰→膝、Knee は膝→足首、Foot は足首→つま先の画像。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum SegmentRole {
    Hip = 0,
    Knee = 1,
    Foot = 2,
}

impl SegmentRole {
    pub const COUNT: usize = 3;
    /// 描画順
    pub const ALL: [SegmentRole; SegmentRole::COUNT] =
        [SegmentRole::Hip, SegmentRole::Knee, SegmentRole::Foot];
}

/// 画像の外接矩形のうち、見た目の脚部が占める割合
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillRatios {
    #[serde(default = "default_hip_ratio")]
    pub hip: f64,
    #[serde(default = "default_knee_ratio")]
    pub knee: f64,
    #[serde(default = "default_foot_ratio")]
    pub foot: f64,
}

fn default_hip_ratio() -> f64 { 0.72 }
fn default_knee_ratio() -> f64 { 0.81 }
fn default_foot_ratio() -> f64 { 0.55 }

impl Default for FillRatios {
    fn default() -> Self {
        Self {
            hip: default_hip_ratio(),
            knee: default_knee_ratio(),
            foot: default_foot_ratio(),
        }
    }
}

impl FillRatios {
    pub fn get(&self, role: SegmentRole) -> f64 {
        match role {
            SegmentRole::Hip => self.hip,
            SegmentRole::Knee => self.knee,
            SegmentRole::Foot => self.foot,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for role in SegmentRole::ALL {
            let r = self.get(role);
            if !(r.is_finite() && r > 0.0) {
                return Err(GaitError::InvalidConfig(format!(
                    "fill ratio for {:?} must be positive, got {}",
                    role, r
                )));
            }
        }
        Ok(())
    }
}

/// 長辺 / fill_ratio がセグメント長になるサイズ（アスペクト比維持、整数切り捨て）
pub fn scaled_size(width: u32, height: u32, length: f64, fill_ratio: f64) -> (u32, u32) {
    let aspect = width as f64 / height as f64;
    let (new_w, new_h) = if width > height {
        let w = length / fill_ratio;
        (w, w / aspect)
    } else {
        let h = length / fill_ratio;
        (h * aspect, h)
    };
    ((new_w as u32).max(1), (new_h as u32).max(1))
}

/// 反時計回り（画面上）に angle_deg 度回転。外接矩形まで拡張し、余白は透明。
///
/// 最近傍サンプリング。角度は正規化せずそのまま扱う。
pub fn rotate_expand(image: &RgbaImage, angle_deg: f64) -> RgbaImage {
    // 90度の倍数で cos/sin が 1e-17 程度になり、サイズが1px膨らむのを防ぐ
    let snap = |v: f64| if v.abs() < 1e-12 { 0.0 } else { v };
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let (sin, cos) = (snap(sin), snap(cos));

    let (w, h) = (image.width() as f64, image.height() as f64);
    let new_w = ((w * cos.abs() + h * sin.abs()) - 1e-9).ceil().max(1.0) as u32;
    let new_h = ((w * sin.abs() + h * cos.abs()) - 1e-9).ceil().max(1.0) as u32;

    let (cx, cy) = (w / 2.0, h / 2.0);
    let (ncx, ncy) = (new_w as f64 / 2.0, new_h as f64 / 2.0);

    RgbaImage::from_fn(new_w, new_h, |x, y| {
        let dx = x as f64 + 0.5 - ncx;
        let dy = y as f64 + 0.5 - ncy;
        let sx = (dx * cos - dy * sin + cx).floor();
        let sy = (dx * sin + dy * cos + cy).floor();
        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *image.get_pixel(sx as u32, sy as u32)
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// セグメント長に合わせて縮尺済みの脚画像
#[derive(Debug, Clone)]
pub struct Sprite {
    image: RgbaImage,
}

impl Sprite {
    /// セグメント長と占有率から縮尺（Lanczos3）
    pub fn scaled_for_segment(image: &RgbaImage, length: f64, fill_ratio: f64) -> Self {
        let (w, h) = scaled_size(image.width(), image.height(), length, fill_ratio);
        Self {
            image: imageops::resize(image, w, h, FilterType::Lanczos3),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn rotated(&self, angle_deg: f64) -> RgbaImage {
        rotate_expand(&self.image, angle_deg)
    }
}

/// 3セグメント分のスプライト
#[derive(Debug, Clone)]
pub struct SpriteSet {
    sprites: [Sprite; SegmentRole::COUNT],
}

impl SpriteSet {
    /// 読み込み済み画像から作成。images は SegmentRole 順。
    pub fn from_images(
        images: [RgbaImage; SegmentRole::COUNT],
        lengths: &SegmentLengths,
        ratios: &FillRatios,
    ) -> Self {
        Self {
            sprites: SegmentRole::ALL.map(|role| {
                Sprite::scaled_for_segment(&images[role as usize], lengths.get(role), ratios.get(role))
            }),
        }
    }

    /// アセットディレクトリから読み込む
    pub fn load(assets: &AssetConfig, lengths: &SegmentLengths) -> Result<Self> {
        assets.fill_ratio.validate()?;
        let images = [
            load_image(&assets.path(SegmentRole::Hip))?,
            load_image(&assets.path(SegmentRole::Knee))?,
            load_image(&assets.path(SegmentRole::Foot))?,
        ];
        let set = Self::from_images(images, lengths, &assets.fill_ratio);
        for role in SegmentRole::ALL {
            let img = set.get(role).image();
            tracing::debug!(?role, width = img.width(), height = img.height(), "sprite scaled");
        }
        Ok(set)
    }

    pub fn get(&self, role: SegmentRole) -> &Sprite {
        &self.sprites[role as usize]
    }
}

fn load_image(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|source| GaitError::Asset {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgba8())
}
