// ==========================================
// 教务排课系统 - 调课申请实体
// ==========================================
// 职责: 调课/借课申请定义
// 约束: 申请是"观察"不是"承诺" —— 创建时的冲突标记仅供展示,
//       审批通过才产生课表副作用
// ==========================================

use crate::domain::types::{DayOfWeek, RequestStatus, RequestType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ScheduleRequest - 调课申请
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub request_id: String,
    /// 申请人 (借课场景下为代课教师)
    pub instructor_id: String,
    pub request_type: RequestType,

    // ===== 申请目标 (按类型可选) =====
    pub course_id: Option<String>,
    pub schedule_id: Option<String>,
    pub room_id: Option<String>,

    // ===== 期望时段 =====
    /// 具体日期 (借课必填)
    pub requested_date: Option<NaiveDate>,
    pub requested_day: Option<DayOfWeek>,
    pub requested_start_minutes: Option<u16>,
    pub requested_end_minutes: Option<u16>,

    pub status: RequestStatus,
    /// 创建时按申请时段预检出的冲突 (仅展示用)
    pub conflict_flag: bool,
    pub conflicts: Vec<String>,

    /// 审批意见
    pub review_note: Option<String>,

    // ===== 展示字段 (读缓存) =====
    pub instructor_name: String,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub room_name: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleRequest {
    /// 是否为借课申请
    pub fn is_borrow(&self) -> bool {
        self.request_type == RequestType::BorrowSchedule
    }
}
