use opencv::{
    core::{Mat, Size, Vec3b},
    prelude::*,
    videoio::VideoWriter,
};
use std::path::{Path, PathBuf};

use crate::error::{GaitError, Result};
use crate::render::Canvas;
use crate::sink::FrameSink;

/// Canvas → BGR Mat（1回のコピーで作成）
fn canvas_to_mat(frame: &Canvas) -> opencv::Result<Mat> {
    let pixels: Vec<Vec3b> = frame
        .to_bgr_bytes()
        .chunks_exact(3)
        .map(|p| Vec3b::from_array([p[0], p[1], p[2]]))
        .collect();
    let borrowed =
        Mat::new_rows_cols_with_data(frame.height() as i32, frame.width() as i32, &pixels)?;
    borrowed.try_clone()
}

/// OpenCVの VideoWriter による動画出力 (mp4v, 固定fps・固定サイズ)
pub struct VideoSink {
    writer: Option<VideoWriter>,
    path: PathBuf,
    width: usize,
    height: usize,
    written: usize,
}

impl VideoSink {
    /// 動画ファイルを開く
    pub fn create<P: AsRef<Path>>(path: P, width: usize, height: usize, fps: f64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_err = |reason: String| GaitError::SinkOpen {
            path: path.clone(),
            reason,
        };

        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v').map_err(|e| open_err(e.to_string()))?;
        let size = Size::new(width as i32, height as i32);
        let writer = VideoWriter::new(&path.to_string_lossy(), fourcc, fps, size, true)
            .map_err(|e| open_err(e.to_string()))?;

        if !writer.is_opened().map_err(|e| open_err(e.to_string()))? {
            return Err(open_err("VideoWriter is not opened".to_string()));
        }

        tracing::info!(path = %path.display(), width, height, fps, "video writer opened");

        Ok(Self {
            writer: Some(writer),
            path,
            width,
            height,
            written: 0,
        })
    }

    fn release(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .release()
                .map_err(|e| GaitError::SinkFinish(format!("{}: {}", self.path.display(), e)))?;
            tracing::info!(path = %self.path.display(), frames = self.written, "video writer released");
        }
        Ok(())
    }
}

impl FrameSink for VideoSink {
    fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(GaitError::FrameWrite {
                index,
                reason: format!(
                    "frame is {}x{}, video is {}x{}",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            });
        }
        let write_err = |e: opencv::Error| GaitError::FrameWrite {
            index,
            reason: e.to_string(),
        };
        let mat = canvas_to_mat(frame).map_err(write_err)?;
        let writer = self.writer.as_mut().ok_or_else(|| GaitError::FrameWrite {
            index,
            reason: "video writer already released".to_string(),
        })?;
        writer.write(&mat).map_err(write_err)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.release()
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(error = %e, "video writer release failed on drop");
        }
    }
}
