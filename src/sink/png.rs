use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GaitError, Result};
use crate::render::Canvas;
use crate::sink::FrameSink;

/// 連番PNGの書き出し先 (frame_00000.png, frame_00001.png, ...)
pub struct PngSequenceSink {
    dir: PathBuf,
    written: usize,
}

impl PngSequenceSink {
    /// ディレクトリを作成して開く
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| GaitError::SinkOpen {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        let removed = remove_stale_frames(&dir).map_err(|e| GaitError::SinkOpen {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        if removed > 0 {
            tracing::info!(dir = %dir.display(), removed, "removed frames from a previous run");
        }
        tracing::info!(dir = %dir.display(), "writing PNG frames");
        Ok(Self { dir, written: 0 })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{:05}.png", index))
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

/// frame_NNNNN.png 形式か
fn is_frame_file(name: &str) -> bool {
    name.strip_prefix("frame_")
        .and_then(|rest| rest.strip_suffix(".png"))
        .map(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// 前回の出力フレームを削除。他のファイルには触れない。
fn remove_stale_frames(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_frame = entry.file_name().to_str().map(is_frame_file).unwrap_or(false);
        if is_frame && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

impl FrameSink for PngSequenceSink {
    fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()> {
        let path = self.frame_path(index);
        frame
            .to_rgb_image()
            .save(&path)
            .map_err(|e| GaitError::FrameWrite {
                index,
                reason: format!("{}: {}", path.display(), e),
            })?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        tracing::info!(dir = %self.dir.display(), frames = self.written, "PNG sequence finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::render::Color;

    #[test]
    fn test_writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames");
        let mut sink = PngSequenceSink::create(&out).unwrap();

        sink.write_frame(0, &Canvas::new(4, 4, Color::RED)).unwrap();
        sink.write_frame(1, &Canvas::new(4, 4, Color::BLUE)).unwrap();
        sink.finish().unwrap();

        assert_eq!(sink.written(), 2);
        let first = image::open(out.join("frame_00000.png")).unwrap().to_rgb8();
        let second = image::open(out.join("frame_00001.png")).unwrap().to_rgb8();
        assert_eq!(first.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(second.get_pixel(3, 3).0, [0, 0, 255]);
    }

    #[test]
    fn test_rerender_replaces_previous_frames() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("notes.txt"), b"keep").unwrap();

        let mut sink = PngSequenceSink::create(&out).unwrap();
        for i in 0..5 {
            sink.write_frame(i, &Canvas::new(2, 2, Color::RED)).unwrap();
        }
        sink.finish().unwrap();

        let mut sink = PngSequenceSink::create(&out).unwrap();
        for i in 0..2 {
            sink.write_frame(i, &Canvas::new(2, 2, Color::BLUE)).unwrap();
        }
        sink.finish().unwrap();

        let mut names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["frame_00000.png", "frame_00001.png", "notes.txt"]);
        let first = image::open(out.join("frame_00000.png")).unwrap().to_rgb8();
        assert_eq!(first.get_pixel(0, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_frame_file_names() {
        assert!(is_frame_file("frame_00000.png"));
        assert!(is_frame_file("frame_123456.png"));
        assert!(!is_frame_file("frame_.png"));
        assert!(!is_frame_file("frame_0001.jpg"));
        assert!(!is_frame_file("myframe_00001.png"));
        assert!(!is_frame_file("frame_00a01.png"));
    }

    #[test]
    fn test_open_fails_under_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let err = PngSequenceSink::create(blocker.join("frames")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Resource);
    }
}
