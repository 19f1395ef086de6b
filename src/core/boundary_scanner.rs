//! 首尾边界扫描器
//!
//! 在幅度接受带 `[min, max]` 内寻找持续至少 `min_run` 帧的第一段样本，
//! 正向返回绝对帧位置，反向返回距文件末尾的帧数（即尾部静音长度）。
//!
//! ## 语义要点
//! - 同一帧内**任一**声道落入接受带即为候选帧（OR）
//! - 候选帧必须连续；非候选帧清零计数并丢弃暂定的起点
//! - `min_run` 为 0 或 1 时单个候选帧即被接受
//! - 整数PCM把接受带按 2^31 满幅换算（四舍五入），浮点PCM直接比较
//!
//! 扫描按固定窗口读取，内存占用为 O(窗口 × 声道)，与文件长度无关。

use crate::audio::{PcmWindow, SampleSource, source::INT_FULL_SCALE};
use crate::error::{AudioError, AudioResult};

/// 扫描窗口大小（帧）
pub const WINDOW_SIZE: usize = 4096;

/// 扫描方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    /// 从 `offset` 向文件尾
    Forward,
    /// 从 `length - offset` 向文件头
    Reverse,
}

/// 幅度接受带（归一化满幅单位）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeBand {
    float_min: f32,
    float_max: f32,
    int_min: u32,
    int_max: u32,
}

impl MagnitudeBand {
    /// 创建接受带，要求 `max > min`
    pub fn new(min: f64, max: f64) -> AudioResult<Self> {
        if max.is_nan() || min.is_nan() || max <= min {
            return Err(AudioError::InvalidInput(format!(
                "接受带上限必须大于下限 / band max must exceed min ({min}, {max})"
            )));
        }
        let full = INT_FULL_SCALE as f64;
        let int_min = (min * full).round().clamp(0.0, full) as u32;
        let int_max = (max * full).round().clamp(int_min as f64, full) as u32;
        Ok(Self {
            float_min: min as f32,
            float_max: max as f32,
            int_min,
            int_max,
        })
    }

    /// 该帧是否有任一声道落入接受带
    #[inline]
    fn any_channel(&self, window: &PcmWindow, frame: usize) -> bool {
        match window {
            PcmWindow::Int(chs) => chs.iter().any(|ch| {
                let magnitude = ch[frame].unsigned_abs();
                magnitude >= self.int_min && magnitude <= self.int_max
            }),
            PcmWindow::Float(chs) => chs.iter().any(|ch| {
                let magnitude = ch[frame].abs();
                magnitude >= self.float_min && magnitude <= self.float_max
            }),
        }
    }
}

/// 连续候选帧计数器
#[derive(Debug)]
struct RunTracker {
    required: u64,
    consecutive: u64,
    first: Option<u64>,
}

impl RunTracker {
    fn new(min_run: u64) -> Self {
        Self {
            required: min_run.max(1),
            consecutive: 0,
            first: None,
        }
    }

    /// 记录一帧；当连续候选数达到要求时返回该段的首个候选位置
    #[inline]
    fn observe(&mut self, position: u64, candidate: bool) -> Option<u64> {
        if !candidate {
            self.consecutive = 0;
            self.first = None;
            return None;
        }
        if self.consecutive == 0 {
            self.first = Some(position);
        }
        self.consecutive += 1;
        if self.consecutive >= self.required {
            self.first
        } else {
            None
        }
    }
}

/// 首尾边界扫描器
///
/// 自身不持有任何可变状态，可在多个线程中对不同文件并发使用。
#[derive(Debug, Clone, Copy)]
pub struct BoundaryScanner {
    band: MagnitudeBand,
    min_run: u64,
}

impl BoundaryScanner {
    pub fn new(band: MagnitudeBand, min_run: u64) -> Self {
        Self { band, min_run }
    }

    /// 扫描边界
    ///
    /// `budget` 为已解析的帧数（“整个文件”由调用方换算）。
    /// 返回 `None` 表示在预算内没有满足条件的段。
    ///
    /// 注意返回值的方向不对称：`Forward` 为绝对帧位置，
    /// `Reverse` 为段内最后一个候选帧之后到文件末尾的帧数。
    pub fn scan(
        &self,
        source: &mut dyn SampleSource,
        direction: SearchDirection,
        offset: u64,
        budget: u64,
    ) -> AudioResult<Option<u64>> {
        let length = source.length_in_samples();
        if budget == 0 || offset >= length {
            return Ok(None);
        }
        let span = budget.min(length - offset);
        let mut window = PcmWindow::new(source.format().sample_kind, source.format().channels_usize());
        let mut tracker = RunTracker::new(self.min_run);

        match direction {
            SearchDirection::Forward => {
                let end = offset + span;
                let mut start = offset;
                while start < end {
                    let want = ((end - start) as usize).min(WINDOW_SIZE);
                    let got = source.read_window(start, want, &mut window)?;
                    for i in 0..want {
                        let candidate = i < got && self.band.any_channel(&window, i);
                        if let Some(first) = tracker.observe(start + i as u64, candidate) {
                            return Ok((first < length).then_some(first));
                        }
                    }
                    start += want as u64;
                }
            }
            SearchDirection::Reverse => {
                let upper = length - offset;
                let lower = upper - span;
                let mut window_end = upper;
                while window_end > lower {
                    let window_start = window_end.saturating_sub(WINDOW_SIZE as u64).max(lower);
                    let want = (window_end - window_start) as usize;
                    let got = source.read_window(window_start, want, &mut window)?;
                    for i in (0..want).rev() {
                        let candidate = i < got && self.band.any_channel(&window, i);
                        if let Some(latest) = tracker.observe(window_start + i as u64, candidate) {
                            return Ok(length.checked_sub(latest + 1));
                        }
                    }
                    window_end = window_start;
                }
            }
        }

        Ok(None)
    }
}
