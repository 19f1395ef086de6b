//! 运行配置模块
//!
//! 命令行解析只产出原始的 `RunSettings`；`RunConfiguration::from_settings`
//! 在任何文件被处理前统一完成校验与钳制，之后配置只读，按引用传递给
//! 编排器、边界扫描器与兼容性评分器。

use crate::error::{AudioError, AudioResult};
use serde::Serialize;

/// 默认的接受带下限（归一化满幅）
pub const DEFAULT_MIN_MAGNITUDE: f64 = 0.003;
/// 默认的接受带上限
pub const DEFAULT_MAX_MAGNITUDE: f64 = 1.0;

/// 未经校验的原始设置（直接来自命令行）
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub offset: i64,
    /// 负数表示整个文件
    pub num_samples: i64,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    pub consecutive: i64,
    /// `Some` 时切换到单声道兼容模式
    pub mono_threshold: Option<f64>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            offset: 0,
            num_samples: -1,
            min_magnitude: DEFAULT_MIN_MAGNITUDE,
            max_magnitude: DEFAULT_MAX_MAGNITUDE,
            consecutive: 0,
            mono_threshold: None,
        }
    }
}

/// 分析模式
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum AnalysisMode {
    /// 首尾静音边界搜索
    Boundary,
    /// 单声道兼容性评分；仅报告得分严格大于阈值的文件
    MonoCompatibility { threshold: f64 },
}

impl AnalysisMode {
    pub fn is_mono(&self) -> bool {
        matches!(self, AnalysisMode::MonoCompatibility { .. })
    }
}

/// 样本搜索预算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchBudget {
    /// 从偏移开始直到文件结束
    Entire,
    /// 最多搜索指定帧数
    Samples(u64),
}

impl SearchBudget {
    /// 针对具体文件长度解析为帧数
    pub fn resolve(&self, length: u64) -> u64 {
        match self {
            SearchBudget::Entire => length,
            SearchBudget::Samples(n) => *n,
        }
    }
}

/// 校验后的不可变运行配置
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfiguration {
    pub start_offset: u64,
    pub search_budget: SearchBudget,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    pub min_run: u64,
    pub mode: AnalysisMode,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            start_offset: 0,
            search_budget: SearchBudget::Entire,
            min_magnitude: DEFAULT_MIN_MAGNITUDE,
            max_magnitude: DEFAULT_MAX_MAGNITUDE,
            min_run: 0,
            mode: AnalysisMode::Boundary,
        }
    }
}

impl RunConfiguration {
    /// 校验原始设置
    ///
    /// 幅度与阈值钳制到 `[0, 1]`；钳制后 `max <= min` 视为输入错误。
    pub fn from_settings(settings: &RunSettings) -> AudioResult<Self> {
        let min_magnitude = clamp_unit(settings.min_magnitude, "min")?;
        let max_magnitude = clamp_unit(settings.max_magnitude, "max")?;
        if max_magnitude <= min_magnitude {
            return Err(AudioError::InvalidInput(format!(
                "最大幅度必须大于最小幅度 / --max must be greater than --min ({max_magnitude} <= {min_magnitude})"
            )));
        }

        let mode = match settings.mono_threshold {
            Some(threshold) => AnalysisMode::MonoCompatibility {
                threshold: clamp_unit(threshold, "mono")?,
            },
            None => AnalysisMode::Boundary,
        };

        let search_budget = if settings.num_samples < 0 {
            SearchBudget::Entire
        } else {
            SearchBudget::Samples(settings.num_samples as u64)
        };

        Ok(Self {
            start_offset: settings.offset.max(0) as u64,
            search_budget,
            min_magnitude,
            max_magnitude,
            min_run: settings.consecutive.max(0) as u64,
            mode,
        })
    }

    /// 单声道模式的阈值（边界模式返回 `None`）
    pub fn mono_threshold(&self) -> Option<f64> {
        match self.mode {
            AnalysisMode::MonoCompatibility { threshold } => Some(threshold),
            AnalysisMode::Boundary => None,
        }
    }
}

fn clamp_unit(value: f64, name: &str) -> AudioResult<f64> {
    if value.is_nan() {
        return Err(AudioError::InvalidInput(format!(
            "--{name} 不是有效数值 / --{name} is not a number"
        )));
    }
    Ok(value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = RunConfiguration::from_settings(&RunSettings::default()).unwrap();
        assert_eq!(config, RunConfiguration::default());
    }

    #[test]
    fn test_magnitudes_are_clamped() {
        let settings = RunSettings {
            min_magnitude: -0.5,
            max_magnitude: 3.0,
            ..Default::default()
        };
        let config = RunConfiguration::from_settings(&settings).unwrap();
        assert_eq!(config.min_magnitude, 0.0);
        assert_eq!(config.max_magnitude, 1.0);
    }

    #[test]
    fn test_inverted_band_rejected() {
        let settings = RunSettings {
            min_magnitude: 0.5,
            max_magnitude: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            RunConfiguration::from_settings(&settings),
            Err(AudioError::InvalidInput(_))
        ));

        // 两端都钳制到1.0后同样非法
        let settings = RunSettings {
            min_magnitude: 2.0,
            max_magnitude: 5.0,
            ..Default::default()
        };
        assert!(RunConfiguration::from_settings(&settings).is_err());
    }

    #[test]
    fn test_negative_values() {
        let settings = RunSettings {
            offset: -10,
            num_samples: -7,
            consecutive: -3,
            ..Default::default()
        };
        let config = RunConfiguration::from_settings(&settings).unwrap();
        assert_eq!(config.start_offset, 0);
        assert_eq!(config.search_budget, SearchBudget::Entire);
        assert_eq!(config.min_run, 0);
    }

    #[test]
    fn test_mono_threshold_clamped() {
        let settings = RunSettings {
            mono_threshold: Some(1.7),
            ..Default::default()
        };
        let config = RunConfiguration::from_settings(&settings).unwrap();
        assert_eq!(config.mono_threshold(), Some(1.0));
        assert!(config.mode.is_mono());

        let settings = RunSettings {
            mono_threshold: Some(f64::NAN),
            ..Default::default()
        };
        assert!(RunConfiguration::from_settings(&settings).is_err());
    }

    #[test]
    fn test_budget_resolve() {
        assert_eq!(SearchBudget::Entire.resolve(1234), 1234);
        assert_eq!(SearchBudget::Samples(0).resolve(1234), 0);
        assert_eq!(SearchBudget::Samples(99).resolve(1234), 99);
    }
}
