use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::calibration::{CalibrationCurve, Joint};
use crate::error::{GaitError, Result};
use crate::kinematics::SegmentLengths;
use crate::render::{Color, FillRatios, SegmentRole};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub rig: RigConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub assets: AssetConfig,
}

/// 関節ごとの校正カーブ上書き。未指定の関節は既定値。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CalibrationConfig {
    pub hip: Option<CalibrationCurve>,
    pub knee: Option<CalibrationCurve>,
    pub foot: Option<CalibrationCurve>,
}

impl CalibrationConfig {
    pub fn curve(&self, joint: Joint) -> Option<CalibrationCurve> {
        match joint {
            Joint::Hip => self.hip,
            Joint::Knee => self.knee,
            Joint::Foot => self.foot,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RigConfig {
    /// 腰関節の固定位置 (x, y) ピクセル
    #[serde(default = "default_hip")]
    pub hip: [f64; 2],
    /// 腰→膝
    #[serde(default = "default_l1")]
    pub l1: f64,
    /// 膝→足首
    #[serde(default = "default_l2")]
    pub l2: f64,
    /// 足首→つま先
    #[serde(default = "default_l3")]
    pub l3: f64,
}

fn default_hip() -> [f64; 2] { [350.0, 100.0] }
fn default_l1() -> f64 { 250.0 }
fn default_l2() -> f64 { 300.0 }
fn default_l3() -> f64 { 90.0 }

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            hip: default_hip(),
            l1: default_l1(),
            l2: default_l2(),
            l3: default_l3(),
        }
    }
}

impl RigConfig {
    pub fn lengths(&self) -> SegmentLengths {
        SegmentLengths::new(self.l1, self.l2, self.l3)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// trueならfpsに合わせて待機しながら出力
    #[serde(default)]
    pub realtime: bool,
    #[serde(default = "default_background")]
    pub background: Color,
    #[serde(default = "default_joint_color")]
    pub joint_color: Color,
    #[serde(default = "default_bone_color")]
    pub bone_color: Color,
    #[serde(default = "default_bone_width")]
    pub bone_width: u32,
    #[serde(default = "default_joint_radius")]
    pub joint_radius: i32,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default = "default_grid_interval")]
    pub grid_interval: usize,
    #[serde(default = "default_grid_color")]
    pub grid_color: Color,
    /// 関節マーカーと骨線を描画
    #[serde(default)]
    pub overlay: bool,
}

fn default_width() -> usize { 1000 }
fn default_height() -> usize { 1000 }
fn default_fps() -> f64 { 10.0 }
fn default_background() -> Color { Color::WHITE }
fn default_joint_color() -> Color { Color::BLACK }
fn default_bone_color() -> Color { Color::BLUE }
fn default_bone_width() -> u32 { 2 }
fn default_joint_radius() -> i32 { 5 }
fn default_true() -> bool { true }
fn default_grid_interval() -> usize { 50 }
fn default_grid_color() -> Color { Color::LIGHT_GRAY }

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            realtime: false,
            background: default_background(),
            joint_color: default_joint_color(),
            bone_color: default_bone_color(),
            bone_width: default_bone_width(),
            joint_radius: default_joint_radius(),
            show_grid: default_true(),
            grid_interval: default_grid_interval(),
            grid_color: default_grid_color(),
            overlay: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    #[serde(default = "default_asset_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_hip_asset")]
    pub hip: String,
    #[serde(default = "default_knee_asset")]
    pub knee: String,
    #[serde(default = "default_foot_asset")]
    pub foot: String,
    /// 画像の外接矩形のうち脚部が占める割合
    #[serde(default)]
    pub fill_ratio: FillRatios,
}

fn default_asset_dir() -> PathBuf { PathBuf::from("assets") }
fn default_hip_asset() -> String { "hip_image.png".to_string() }
fn default_knee_asset() -> String { "knee_image.png".to_string() }
fn default_foot_asset() -> String { "foot_image.png".to_string() }

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: default_asset_dir(),
            hip: default_hip_asset(),
            knee: default_knee_asset(),
            foot: default_foot_asset(),
            fill_ratio: FillRatios::default(),
        }
    }
}

impl AssetConfig {
    pub fn path(&self, role: SegmentRole) -> PathBuf {
        let name = match role {
            SegmentRole::Hip => &self.hip,
            SegmentRole::Knee => &self.knee,
            SegmentRole::Foot => &self.foot,
        };
        self.dir.join(name)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            GaitError::InvalidConfig(format!("{}: {}", path.display(), e.message()))
        })?;
        Ok(config)
    }

    /// ファイルが無ければ既定値。存在するが読めない・不正な場合はエラー。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "config not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// フレーム処理前に設定全体を検査
    pub fn validate(&self) -> Result<()> {
        for joint in Joint::ALL {
            if let Some(curve) = self.calibration.curve(joint) {
                curve.validate(joint)?;
            }
        }

        let rig = &self.rig;
        if ![rig.l1, rig.l2, rig.l3, rig.hip[0], rig.hip[1]]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(GaitError::InvalidConfig("rig values must be finite".into()));
        }

        let render = &self.render;
        if render.width == 0 || render.height == 0 {
            return Err(GaitError::InvalidConfig(format!(
                "frame size must be positive, got {}x{}",
                render.width, render.height
            )));
        }
        if !(render.fps.is_finite() && render.fps > 0.0) {
            return Err(GaitError::InvalidConfig(format!(
                "fps must be positive, got {}",
                render.fps
            )));
        }
        if render.grid_interval == 0 {
            return Err(GaitError::InvalidConfig("grid_interval must be positive".into()));
        }
        let max_extent = render.width.max(render.height);
        if render.joint_radius < 0 || render.joint_radius as usize > max_extent {
            return Err(GaitError::InvalidConfig(format!(
                "joint_radius must be within 0..={}, got {}",
                max_extent, render.joint_radius
            )));
        }
        if render.bone_width as usize > max_extent {
            return Err(GaitError::InvalidConfig(format!(
                "bone_width must be within 0..={}, got {}",
                max_extent, render.bone_width
            )));
        }

        self.assets.fill_ratio.validate()
    }
}
