// ==========================================
// 教务排课系统 - 课表实体
// ==========================================
// 职责: 课表行定义 (周期性时段 + 一次性借课实例)
// 约束: conflicts/借课链接字段由引擎写入, 展示字段仅为读缓存
// ==========================================

use crate::domain::types::{format_minutes, DayOfWeek, ScheduleStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// BorrowedInstance - 源课表上的借课记录
// ==========================================
// 挂在源(周期性)课表行上, 报告哪些日期已被代课
// 约束: 每个 request_id 至多一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedInstance {
    pub date: NaiveDate,
    pub request_id: String,
    pub replacement_instructor_id: String,
    pub replacement_instructor_name: String,
}

// ==========================================
// Schedule - 课表行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub schedule_id: String,
    pub course_id: String,
    pub instructor_id: String,
    pub room_id: String,

    pub day_of_week: DayOfWeek,
    /// 起始时间 (自零点起的分钟数)
    pub start_minutes: u16,
    /// 结束时间 (半开区间)
    pub end_minutes: u16,

    pub term: String,
    pub year: i32,
    /// 学年标签 (如 "2024-2025")
    pub academic_year: String,

    pub status: ScheduleStatus,
    /// 强制保存时记录的违规描述列表
    pub conflicts: Vec<String>,

    /// 一次性日期 (借课实例使用; 为空表示按星期周期性上课)
    pub schedule_date: Option<NaiveDate>,

    // ===== 借课链接字段 =====
    pub is_borrowed_instance: bool,
    pub source_schedule_id: Option<String>,
    pub borrow_request_id: Option<String>,
    pub original_instructor_id: Option<String>,
    pub original_instructor_name: Option<String>,
    pub borrow_date: Option<NaiveDate>,
    /// 源课表上的借课记录列表 (仅源行维护)
    pub borrowed_instances: Vec<BorrowedInstance>,

    // ===== 班级群体键 (排课时从课程复制, 课程身份排定后不可变) =====
    pub year_level: i32,
    pub section: String,

    // ===== 展示字段 (读缓存, 写入时从引用实体重算, 不参与冲突逻辑) =====
    pub course_code: String,
    pub course_name: String,
    pub instructor_name: String,
    pub room_name: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    /// 是否计入冲突检测快照 (忽略已取消行)
    pub fn is_active(&self) -> bool {
        self.status != ScheduleStatus::Canceled
    }

    /// 时长 (分钟)
    pub fn duration_minutes(&self) -> u16 {
        self.end_minutes.saturating_sub(self.start_minutes)
    }

    /// 班级群体键 (与 Course::section_key 一致)
    pub fn section_key(&self) -> String {
        format!("{}-{}-{}", self.year_level, self.section, self.term)
    }

    /// 该 request_id 是否已有借课记录 (审批重试的幂等守卫)
    pub fn has_borrowed_instance_for(&self, request_id: &str) -> bool {
        self.borrowed_instances
            .iter()
            .any(|b| b.request_id == request_id)
    }

    /// 时段描述 (供冲突原因与日志使用)
    pub fn slot_label(&self) -> String {
        match self.schedule_date {
            Some(date) => format!(
                "{} {}-{}",
                date,
                format_minutes(self.start_minutes),
                format_minutes(self.end_minutes)
            ),
            None => format!(
                "{} {}-{}",
                self.day_of_week,
                format_minutes(self.start_minutes),
                format_minutes(self.end_minutes)
            ),
        }
    }
}
