// ==========================================
// 教务排课系统 - 教师实体
// ==========================================
// 职责: 教师主数据与可用时段定义
// 约束: 可用时段在实体边界校验 (有序且互不重叠),
//       冲突检测引擎不再处理畸形数据
// ==========================================

use crate::domain::types::{format_minutes, DayOfWeek};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ==========================================
// TimeWindow - 可用时段 [start, end)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// 起始 (自零点起的分钟数)
    pub start: u16,
    /// 结束 (半开区间)
    pub end: u16,
}

impl TimeWindow {
    /// 时段是否完整包含 [start, end)
    pub fn contains(&self, start: u16, end: u16) -> bool {
        self.start <= start && end <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_minutes(self.start), format_minutes(self.end))
    }
}

// ==========================================
// AvailabilityError - 可用时段校验错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    /// 时段结束不晚于开始
    EmptyWindow { day: DayOfWeek, window: TimeWindow },
    /// 同一天内时段未按开始时间排序
    Unsorted { day: DayOfWeek },
    /// 同一天内时段重叠
    Overlapping { day: DayOfWeek, first: TimeWindow, second: TimeWindow },
}

impl fmt::Display for AvailabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityError::EmptyWindow { day, window } => {
                write!(f, "可用时段为空或倒置: {} {}", day, window)
            }
            AvailabilityError::Unsorted { day } => {
                write!(f, "可用时段未排序: {}", day)
            }
            AvailabilityError::Overlapping { day, first, second } => {
                write!(f, "可用时段重叠: {} {} 与 {}", day, first, second)
            }
        }
    }
}

// ==========================================
// Instructor - 教师主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructor {
    pub instructor_id: String,
    pub name: String,
    /// 每周最大课时 (小时)
    pub max_hours_per_week: i32,
    /// 专业方向集合 (与课程 department/类型求交用于自动排课)
    pub specializations: BTreeSet<String>,
    /// 可用时段: 星期 -> 有序不重叠时段列表
    pub availability: BTreeMap<DayOfWeek, Vec<TimeWindow>>,
}

impl Instructor {
    /// 校验可用时段结构 (入库边界调用)
    ///
    /// # 返回
    /// - `Ok(())`: 每天的时段有序且互不重叠
    /// - `Err(AvailabilityError)`: 第一处违规
    pub fn validate_availability(&self) -> Result<(), AvailabilityError> {
        for (day, windows) in &self.availability {
            for window in windows {
                if window.end <= window.start {
                    return Err(AvailabilityError::EmptyWindow {
                        day: *day,
                        window: *window,
                    });
                }
            }
            for pair in windows.windows(2) {
                if pair[1].start < pair[0].start {
                    return Err(AvailabilityError::Unsorted { day: *day });
                }
                // 有序前提下, 只需检查相邻时段
                if pair[1].start < pair[0].end {
                    return Err(AvailabilityError::Overlapping {
                        day: *day,
                        first: pair[0],
                        second: pair[1],
                    });
                }
            }
        }
        Ok(())
    }

    /// 指定星期的某个声明时段是否完整覆盖 [start, end)
    pub fn is_available(&self, day: DayOfWeek, start: u16, end: u16) -> bool {
        self.availability
            .get(&day)
            .map(|windows| windows.iter().any(|w| w.contains(start, end)))
            .unwrap_or(false)
    }

    /// 每周最大课时对应的分钟数
    pub fn max_minutes_per_week(&self) -> i64 {
        i64::from(self.max_hours_per_week) * 60
    }
}
