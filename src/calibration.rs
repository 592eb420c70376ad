use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::CalibrationConfig;
use crate::error::{GaitError, Result};
use crate::signals::SignalRow;

// --- 関節 ---

/// 信号テーブルの関節列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum Joint {
    Hip = 0,
    Knee = 1,
    Foot = 2,
}

impl Joint {
    pub const COUNT: usize = 3;
    pub const ALL: [Joint; Joint::COUNT] = [Joint::Hip, Joint::Knee, Joint::Foot];

    /// 生信号の列名
    pub fn column(self) -> &'static str {
        match self {
            Joint::Hip => "Hip",
            Joint::Knee => "Knee",
            Joint::Foot => "Foot",
        }
    }

    /// 角度列の列名
    pub fn angle_column(self) -> &'static str {
        match self {
            Joint::Hip => "Hip (Angle)",
            Joint::Knee => "Knee (Angle)",
            Joint::Foot => "Foot (Angle)",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// --- 校正カーブ ---

/// 生信号レンジ → 角度レンジの2点線形マッピング
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCurve {
    pub signal_min: f64,
    pub signal_max: f64,
    pub angle_min: f64,
    pub angle_max: f64,
}

impl CalibrationCurve {
    pub const fn new(signal_min: f64, signal_max: f64, angle_min: f64, angle_max: f64) -> Self {
        Self {
            signal_min,
            signal_max,
            angle_min,
            angle_max,
        }
    }

    /// 関節ごとの既定カーブ
    pub const fn default_for(joint: Joint) -> Self {
        match joint {
            Joint::Knee => Self::new(0.0, 152.0, 100.0, 170.0),
            Joint::Foot => Self::new(0.0, 150.0, 85.0, 140.0),
            Joint::Hip => Self::new(0.0, 45.0, -15.0, 60.0),
        }
    }

    /// 補間が定義できるか検査
    ///
    /// signal_min == signal_max（NaNを含む）はゼロ除算になるので拒否する。
    pub fn validate(&self, joint: Joint) -> Result<()> {
        let span = self.signal_max - self.signal_min;
        if span == 0.0 || span.is_nan() {
            return Err(GaitError::DegenerateCurve {
                joint,
                value: self.signal_min,
            });
        }
        Ok(())
    }

    /// 生信号を角度（度）へ変換
    ///
    /// クランプしない。レンジ外の信号は線形に外挿される。
    pub fn apply(&self, raw: f64) -> f64 {
        self.angle_min
            + (self.angle_max - self.angle_min) * (raw - self.signal_min)
                / (self.signal_max - self.signal_min)
    }
}

// --- 角度サンプル ---

/// 1フレーム分の校正済み関節角（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    pub hip: f64,
    pub knee: f64,
    pub foot: f64,
}

impl AngleSample {
    pub fn new(hip: f64, knee: f64, foot: f64) -> Self {
        Self { hip, knee, foot }
    }

    pub fn get(&self, joint: Joint) -> f64 {
        match joint {
            Joint::Hip => self.hip,
            Joint::Knee => self.knee,
            Joint::Foot => self.foot,
        }
    }
}

// --- 変換器 ---

/// 信号→角度マッパー。関節ごとに検証済みのカーブを1本ずつ保持する。
#[derive(Debug, Clone)]
pub struct Calibrator {
    curves: [CalibrationCurve; Joint::COUNT],
}

impl Calibrator {
    /// カーブを検証して作成
    pub fn new(curves: [CalibrationCurve; Joint::COUNT]) -> Result<Self> {
        for joint in Joint::ALL {
            curves[joint as usize].validate(joint)?;
        }
        Ok(Self { curves })
    }

    /// 設定から作成（未指定の関節は既定カーブ）
    pub fn from_config(config: &CalibrationConfig) -> Result<Self> {
        let curves = Joint::ALL.map(|joint| {
            config
                .curve(joint)
                .unwrap_or_else(|| CalibrationCurve::default_for(joint))
        });
        Self::new(curves)
    }

    pub fn curve(&self, joint: Joint) -> &CalibrationCurve {
        &self.curves[joint as usize]
    }

    pub fn calibrate(&self, joint: Joint, raw: f64) -> f64 {
        self.curve(joint).apply(raw)
    }

    /// 1行分の生信号を角度へ
    pub fn sample(&self, row: &SignalRow) -> AngleSample {
        AngleSample {
            hip: self.calibrate(Joint::Hip, row.hip),
            knee: self.calibrate(Joint::Knee, row.knee),
            foot: self.calibrate(Joint::Foot, row.foot),
        }
    }

    /// 全行を変換（行順を保持）
    pub fn convert(&self, rows: &[SignalRow]) -> Vec<AngleSample> {
        rows.iter().map(|row| self.sample(row)).collect()
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self {
            curves: Joint::ALL.map(CalibrationCurve::default_for),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_exact_linear_mapping() {
        let curve = CalibrationCurve::new(0.0, 100.0, 0.0, 90.0);
        assert_eq!(curve.apply(50.0), 45.0);
        assert_eq!(curve.apply(0.0), 0.0);
        assert_eq!(curve.apply(100.0), 90.0);
    }

    #[test]
    fn test_extrapolates_without_clamping() {
        let curve = CalibrationCurve::new(0.0, 100.0, 0.0, 90.0);
        assert_eq!(curve.apply(150.0), 135.0);
        assert_eq!(curve.apply(-100.0), -90.0);
    }

    #[test]
    fn test_default_curves() {
        let cal = Calibrator::default();
        assert_eq!(*cal.curve(Joint::Knee), CalibrationCurve::new(0.0, 152.0, 100.0, 170.0));
        assert_eq!(*cal.curve(Joint::Foot), CalibrationCurve::new(0.0, 150.0, 85.0, 140.0));
        assert_eq!(*cal.curve(Joint::Hip), CalibrationCurve::new(0.0, 45.0, -15.0, 60.0));
    }

    #[test]
    fn test_zero_signal_gives_angle_min() {
        let cal = Calibrator::default();
        let sample = cal.sample(&SignalRow::new(0.0, 0.0, 0.0));
        assert_eq!(sample, AngleSample::new(-15.0, 100.0, 85.0));
    }

    #[test]
    fn test_signal_max_gives_angle_max() {
        let cal = Calibrator::default();
        let sample = cal.sample(&SignalRow::new(45.0, 152.0, 150.0));
        assert_eq!(sample, AngleSample::new(60.0, 170.0, 140.0));
    }

    #[test]
    fn test_degenerate_curve_rejected() {
        let mut curves = Joint::ALL.map(CalibrationCurve::default_for);
        curves[Joint::Foot as usize] = CalibrationCurve::new(10.0, 10.0, 0.0, 90.0);
        let err = Calibrator::new(curves).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(err, GaitError::DegenerateCurve { joint: Joint::Foot, .. }));
    }

    #[test]
    fn test_nan_bounds_rejected() {
        let curve = CalibrationCurve::new(f64::NAN, 10.0, 0.0, 1.0);
        assert!(curve.validate(Joint::Hip).is_err());
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = CalibrationConfig {
            knee: Some(CalibrationCurve::new(0.0, 100.0, 0.0, 90.0)),
            ..CalibrationConfig::default()
        };
        let cal = Calibrator::from_config(&config).unwrap();
        assert_eq!(cal.calibrate(Joint::Knee, 50.0), 45.0);
        assert_eq!(*cal.curve(Joint::Hip), CalibrationCurve::default_for(Joint::Hip));
        assert_eq!(*cal.curve(Joint::Foot), CalibrationCurve::default_for(Joint::Foot));
    }

    #[test]
    fn test_convert_preserves_order() {
        let cal = Calibrator::default();
        let rows = vec![
            SignalRow::new(0.0, 0.0, 0.0),
            SignalRow::new(45.0, 0.0, 0.0),
            SignalRow::new(22.5, 0.0, 0.0),
        ];
        let hips: Vec<f64> = cal.convert(&rows).iter().map(|s| s.hip).collect();
        assert_eq!(hips, vec![-15.0, 60.0, 22.5]);
    }

    #[test]
    fn test_column_names() {
        assert_eq!(Joint::Hip.angle_column(), "Hip (Angle)");
        assert_eq!(Joint::Foot.to_string(), "Foot");
    }
}
