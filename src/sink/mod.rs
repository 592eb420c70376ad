//! Frame sinks: ordered consumers of composed frames.

pub mod png;
#[cfg(feature = "desktop")]
pub mod video;

pub use png::PngSequenceSink;
#[cfg(feature = "desktop")]
pub use video::VideoSink;

use crate::error::Result;
use crate::render::Canvas;

/// 合成済みフレームの出力先
///
/// write_frame は入力行の順に1回ずつ呼ばれる。finish は成功・失敗に関わらず最後に1回呼ばれる。
pub trait FrameSink {
    fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()>;

    /// 出力を確定してリソースを解放
    fn finish(&mut self) -> Result<()>;
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()> {
        (**self).write_frame(index, frame)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// 複数の出力先へ同じフレームを配る
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: FrameSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }
}

impl FrameSink for FanOut {
    fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.write_frame(index, frame)?;
        }
        Ok(())
    }

    /// 全ての出力先を finish する。最初のエラーを返す。
    fn finish(&mut self) -> Result<()> {
        let mut first_err = None;
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.finish() {
                tracing::warn!(error = %e, "sink finish failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::GaitError;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// テスト用: 受け取ったフレーム番号と先頭画素を記録
    #[derive(Default, Clone)]
    pub struct RecordingSink {
        pub log: Rc<RefCell<Vec<(usize, u32)>>>,
        pub finished: Rc<RefCell<usize>>,
        pub fail_at: Option<usize>,
    }

    impl FrameSink for RecordingSink {
        fn write_frame(&mut self, index: usize, frame: &Canvas) -> Result<()> {
            if self.fail_at == Some(index) {
                return Err(GaitError::FrameWrite {
                    index,
                    reason: "injected".into(),
                });
            }
            self.log.borrow_mut().push((index, frame.buffer()[0]));
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            *self.finished.borrow_mut() += 1;
            Ok(())
        }
    }
}
