use minifb::{Key, Window, WindowOptions};

use crate::error::{GaitError, Result};
use crate::render::Canvas;
use crate::sink::FrameSink;

/// minifbを使用したプレビューウィンドウ
///
/// ウィンドウを閉じるかEscで Interrupted を返し、描画ループを止める。
pub struct PreviewWindow {
    window: Window,
    width: usize,
    height: usize,
}

impl PreviewWindow {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| GaitError::SinkOpen {
            path: title.into(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            window,
            width,
            height,
        })
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }
}

impl FrameSink for PreviewWindow {
    fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()> {
        if !self.is_open() {
            return Err(GaitError::Interrupted(index));
        }
        if frame.width() != self.width || frame.height() != self.height {
            return Err(GaitError::FrameWrite {
                index,
                reason: format!(
                    "frame is {}x{}, window is {}x{}",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            });
        }
        self.window
            .update_with_buffer(frame.buffer(), self.width, self.height)
            .map_err(|e| GaitError::FrameWrite {
                index,
                reason: e.to_string(),
            })
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
