// ==========================================
// 教务排课系统 - 冲突检测引擎
// ==========================================
// 职责: 对候选时段评估全部排课硬约束, 输出全部违规描述
// 红线: 纯函数, 无副作用, 只读快照, 可并发调用
// 红线: 不短路 —— 调用方需要完整的违规清单
// ==========================================
// 重叠判定: startA < endB && startB < endA (半开区间, 紧邻不冲突)
// 同日判定: 双方都无具体日期时比较星期; 任一方有具体日期时
//           要求日期严格相等 (一次性实例是对周期行的"挖孔"例外)
// ==========================================

use crate::domain::course::Course;
use crate::domain::instructor::Instructor;
use crate::domain::room::Room;
use crate::domain::schedule::Schedule;
use crate::domain::types::{format_minutes, DayOfWeek};
use chrono::NaiveDate;
use tracing::instrument;

// ==========================================
// ScheduleCandidate - 待检测的候选分配
// ==========================================
#[derive(Debug, Clone)]
pub struct ScheduleCandidate<'a> {
    pub course: &'a Course,
    pub room: &'a Room,
    pub instructor: &'a Instructor,
    pub day_of_week: DayOfWeek,
    /// 一次性日期 (借课实例); 为空表示周期性
    pub schedule_date: Option<NaiveDate>,
    pub start_minutes: u16,
    pub end_minutes: u16,
}

impl ScheduleCandidate<'_> {
    /// 实际生效的星期 (有具体日期时取该日期的星期)
    fn effective_day(&self) -> DayOfWeek {
        match self.schedule_date {
            Some(date) => DayOfWeek::from_date(date),
            None => self.day_of_week,
        }
    }

    fn duration_minutes(&self) -> u16 {
        self.end_minutes.saturating_sub(self.start_minutes)
    }
}

/// 半开区间重叠判定: [a_start, a_end) 与 [b_start, b_end)
pub fn overlaps(a_start: u16, a_end: u16, b_start: u16, b_end: u16) -> bool {
    a_start < b_end && b_start < a_end
}

/// 同一授课日判定
///
/// 双方都无具体日期 -> 比较星期;
/// 任一方有具体日期 -> 要求双方日期严格相等
pub fn same_occurrence(
    a_day: DayOfWeek,
    a_date: Option<NaiveDate>,
    b_day: DayOfWeek,
    b_date: Option<NaiveDate>,
) -> bool {
    match (a_date, b_date) {
        (None, None) => a_day == b_day,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

// ==========================================
// ConflictDetector - 冲突检测引擎
// ==========================================
pub struct ConflictDetector {
    // 无状态引擎, 不需要注入依赖
}

impl ConflictDetector {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 检测候选分配在快照中的全部违规
    ///
    /// # 参数
    /// - `candidate`: 候选分配 (教室/教师/课程快照在调用前已加载)
    /// - `exclude_id`: 更新场景下排除自身旧行, 避免自我冲突
    /// - `active`: 同 (term, year) 非取消课表快照
    ///
    /// # 返回
    /// 违规描述列表; 空表示可排
    #[instrument(skip_all, fields(
        course_code = %candidate.course.code,
        room = %candidate.room.name,
        instructor = %candidate.instructor.name,
        candidates = active.len()
    ))]
    pub fn detect(
        &self,
        candidate: &ScheduleCandidate<'_>,
        exclude_id: Option<&str>,
        active: &[Schedule],
    ) -> Vec<String> {
        let mut conflicts = Vec::new();
        let section_key = candidate.course.section_key();

        // ===== 与快照中每一行的资源互斥 =====
        for other in active {
            if exclude_id == Some(other.schedule_id.as_str()) {
                continue;
            }
            if !other.is_active() {
                continue;
            }
            if !same_occurrence(
                candidate.day_of_week,
                candidate.schedule_date,
                other.day_of_week,
                other.schedule_date,
            ) {
                continue;
            }
            if !overlaps(
                candidate.start_minutes,
                candidate.end_minutes,
                other.start_minutes,
                other.end_minutes,
            ) {
                continue;
            }

            // 教室互斥
            if other.room_id == candidate.room.room_id {
                conflicts.push(format!(
                    "ROOM_CONFLICT: room {} already booked by {} at {}",
                    candidate.room.name, other.course_code, other.slot_label()
                ));
            }

            // 教师互斥
            if other.instructor_id == candidate.instructor.instructor_id {
                conflicts.push(format!(
                    "INSTRUCTOR_CONFLICT: instructor {} double-booked with {} at {}",
                    candidate.instructor.name, other.course_code, other.slot_label()
                ));
            }

            // 班级群体互斥
            if other.section_key() == section_key {
                conflicts.push(format!(
                    "SECTION_CONFLICT: section {}-{} already attends {} at {}",
                    other.year_level, other.section, other.course_code, other.slot_label()
                ));
            }
        }

        // ===== 教师可用时段 =====
        let effective_day = candidate.effective_day();
        if !candidate.instructor.is_available(
            effective_day,
            candidate.start_minutes,
            candidate.end_minutes,
        ) {
            conflicts.push(format!(
                "INSTRUCTOR_UNAVAILABLE: instructor {} has no declared window covering {} {}-{}",
                candidate.instructor.name,
                effective_day,
                format_minutes(candidate.start_minutes),
                format_minutes(candidate.end_minutes)
            ));
        }

        // ===== 教师周课时上限 =====
        let mut weekly_minutes = i64::from(candidate.duration_minutes());
        for other in active {
            if exclude_id == Some(other.schedule_id.as_str()) {
                continue;
            }
            if other.is_active() && other.instructor_id == candidate.instructor.instructor_id {
                weekly_minutes += i64::from(other.duration_minutes());
            }
        }
        let max_minutes = candidate.instructor.max_minutes_per_week();
        if weekly_minutes > max_minutes {
            conflicts.push(format!(
                "INSTRUCTOR_OVERLOADED: weekly load would reach {} minutes, max {} minutes",
                weekly_minutes, max_minutes
            ));
        }

        // ===== 教室容量与设备 =====
        if candidate.room.capacity < candidate.course.required_capacity {
            conflicts.push(format!(
                "ROOM_TOO_SMALL: room {} capacity {} < required {}",
                candidate.room.name, candidate.room.capacity, candidate.course.required_capacity
            ));
        }
        let missing: Vec<&String> = candidate
            .course
            .required_equipment
            .iter()
            .filter(|e| !candidate.room.equipment.contains(*e))
            .collect();
        if !missing.is_empty() {
            conflicts.push(format!(
                "ROOM_MISSING_EQUIPMENT: room {} lacks {:?}",
                candidate.room.name, missing
            ));
        }

        conflicts
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new()
    }
}
