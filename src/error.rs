use std::path::PathBuf;

use crate::calibration::Joint;

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 設定不正（フレーム処理開始前に検出）
    Configuration,
    /// 入力テーブルの欠損・不正値
    Input,
    /// 出力先・アセットを開けない
    Resource,
    /// フレームループ中の失敗
    Runtime,
}

#[derive(Debug, thiserror::Error)]
pub enum GaitError {
    #[error("degenerate calibration curve for {joint}: signal_min == signal_max ({value})")]
    DegenerateCurve { joint: Joint, value: f64 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("row {row}: invalid value for column {column}: {reason}")]
    InvalidCell {
        row: usize,
        column: &'static str,
        reason: String,
    },

    #[error("failed to read signal table: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load asset {}: {source}", path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to open output {}: {reason}", path.display())]
    SinkOpen { path: PathBuf, reason: String },

    #[error("failed to write frame {index}: {reason}")]
    FrameWrite { index: usize, reason: String },

    #[error("failed to finalize output: {0}")]
    SinkFinish(String),

    #[error("render interrupted at frame {0}")]
    Interrupted(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GaitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GaitError::DegenerateCurve { .. } | GaitError::InvalidConfig(_) => {
                ErrorKind::Configuration
            }
            GaitError::MissingColumn(_) | GaitError::InvalidCell { .. } | GaitError::Csv(_) => {
                ErrorKind::Input
            }
            GaitError::Asset { .. } | GaitError::SinkOpen { .. } | GaitError::Io(_) => {
                ErrorKind::Resource
            }
            GaitError::FrameWrite { .. }
            | GaitError::SinkFinish(_)
            | GaitError::Interrupted(_) => ErrorKind::Runtime,
        }
    }
}

pub type Result<T> = std::result::Result<T, GaitError>;
