use nalgebra::Point2;
use std::thread;
use std::time::{Duration, Instant};

use crate::calibration::{AngleSample, Calibrator};
use crate::error::Result;
use crate::kinematics::{FrameGeometry, SegmentChain, SegmentLengths};
use crate::render::Compositor;
use crate::signals::SignalRow;
use crate::sink::FrameSink;

/// アニメーション全体で固定されるリグ（腰位置とセグメント長）
#[derive(Debug, Clone, Copy)]
pub struct Rig {
    pub hip: Point2<f64>,
    pub lengths: SegmentLengths,
}

impl Rig {
    pub fn new(hip: Point2<f64>, lengths: SegmentLengths) -> Self {
        Self { hip, lengths }
    }

    pub fn chain(&self, angles: AngleSample) -> SegmentChain {
        SegmentChain::new(self.hip, self.lengths, angles)
    }
}

impl Default for Rig {
    fn default() -> Self {
        Self::new(Point2::new(350.0, 100.0), SegmentLengths::default())
    }
}

/// フレーム送りのペース制御
///
/// realtime でなければ待機しない。待機は出力内容に影響しない。
#[derive(Debug, Clone)]
pub struct FramePacer {
    frame_duration: Duration,
    realtime: bool,
    last: Option<Instant>,
}

impl FramePacer {
    pub fn new(fps: f64, realtime: bool) -> Self {
        Self {
            frame_duration: Duration::from_secs_f64(1.0 / fps),
            realtime,
            last: None,
        }
    }

    /// オフライン出力（待機なし）
    pub fn offline() -> Self {
        Self::new(10.0, false)
    }

    /// 前フレームから frame_duration 経過するまで待つ
    pub fn wait(&mut self) {
        if !self.realtime {
            return;
        }
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.frame_duration {
                thread::sleep(self.frame_duration - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// 描画結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_written: usize,
}

/// 入力行の順にフレームを生成・出力するドライバ
#[derive(Debug, Clone)]
pub struct GaitAnimation {
    rig: Rig,
    samples: Vec<AngleSample>,
}

impl GaitAnimation {
    pub fn new(rig: Rig, samples: Vec<AngleSample>) -> Self {
        Self { rig, samples }
    }

    /// 生信号行を校正して作成
    pub fn from_rows(calibrator: &Calibrator, rig: Rig, rows: &[SignalRow]) -> Self {
        Self::new(rig, calibrator.convert(rows))
    }

    pub fn samples(&self) -> &[AngleSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 各フレームの幾何を遅延生成。呼ぶたびに先頭から。
    pub fn frames(&self) -> impl ExactSizeIterator<Item = FrameGeometry> + '_ {
        let rig = self.rig;
        self.samples.iter().map(move |s| rig.chain(*s).solve())
    }

    /// 全フレームを合成して sink へ書き出す
    ///
    /// フレームN+1はフレームNの書き出し後に合成する。途中で失敗しても sink.finish は必ず呼ぶ。
    /// 書き出し済みのフレームは残る。
    pub fn render<S: FrameSink + ?Sized>(
        &self,
        compositor: &Compositor,
        sink: &mut S,
        pacer: &mut FramePacer,
    ) -> Result<RenderStats> {
        if self.is_empty() {
            tracing::warn!("signal table has no rows, no frames will be written");
        }

        let result = self.render_frames(compositor, sink, pacer);
        let finished = sink.finish();

        let stats = result?;
        finished?;
        tracing::info!(frames = stats.frames_written, "render finished");
        Ok(stats)
    }

    fn render_frames<S: FrameSink + ?Sized>(
        &self,
        compositor: &Compositor,
        sink: &mut S,
        pacer: &mut FramePacer,
    ) -> Result<RenderStats> {
        let mut frames_written = 0;
        for (index, geometry) in self.frames().enumerate() {
            tracing::debug!(
                index,
                hip_angle = geometry.hip_angle,
                knee_angle = geometry.knee_angle,
                foot_angle = geometry.foot_angle,
                "frame"
            );
            let canvas = compositor.compose(&geometry);
            pacer.wait();
            sink.write_frame(index, &canvas).map_err(|e| {
                tracing::error!(index, error = %e, "frame write failed");
                e
            })?;
            frames_written += 1;
        }
        Ok(RenderStats { frames_written })
    }
}
