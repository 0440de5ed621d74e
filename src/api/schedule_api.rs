// ==========================================
// 教务排课系统 - 课表 API
// ==========================================
// 职责: 课表创建/更新/取消/查询 + 自动排课入口
// 约定: 载荷里时间为 "HH:MM" 字符串, 星期为 SCREAMING_SNAKE 字符串,
//       API 层完成解析后才进引擎
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::schedule::Schedule;
use crate::domain::types::{parse_hhmm, DayOfWeek};
use crate::engine::generator::{
    AutoGenerator, GenerationRequest, GenerationStats, WorkingHours,
};
use crate::engine::writer::{ScheduleWriteInput, ScheduleWriter, WriteOutcome};
use crate::repository::schedule_repo::ScheduleRepository;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

// ==========================================
// 载荷定义
// ==========================================

/// 课表分配载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePayload {
    pub course_id: String,
    pub instructor_id: String,
    pub room_id: String,
    /// MONDAY..SUNDAY
    pub day_of_week: String,
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub end_time: String,
    pub term: String,
    pub year: i32,
    pub academic_year: String,
    /// 一次性日期 (可选)
    pub schedule_date: Option<NaiveDate>,
}

/// 自动排课载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePayload {
    pub term: String,
    pub year: i32,
    pub academic_year: String,
    /// "HH:MM", 缺省 07:00
    pub working_start: Option<String>,
    /// "HH:MM", 缺省 17:00
    pub working_end: Option<String>,
    #[serde(default)]
    pub regenerate: bool,
    /// false 为试运行
    pub save_to_database: bool,
    pub semester_start_date: Option<NaiveDate>,
}

// ==========================================
// ScheduleApi - 课表 API
// ==========================================
pub struct ScheduleApi {
    writer: Arc<ScheduleWriter>,
    generator: Arc<AutoGenerator>,
    schedule_repo: Arc<ScheduleRepository>,
}

impl ScheduleApi {
    /// 构造函数
    pub fn new(
        writer: Arc<ScheduleWriter>,
        generator: Arc<AutoGenerator>,
        schedule_repo: Arc<ScheduleRepository>,
    ) -> Self {
        Self {
            writer,
            generator,
            schedule_repo,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 创建课表
    ///
    /// # 返回
    /// - `Ok(Schedule)`: 已落库 (force 时可能为 CONFLICT 状态)
    /// - `Err(ScheduleConflict)`: force=false 且存在冲突, 零落库
    pub fn create_schedule(&self, payload: &SchedulePayload, force: bool) -> ApiResult<Schedule> {
        let input = Self::parse_payload(payload)?;
        match self.writer.create(&input, force)? {
            WriteOutcome::Persisted(schedule) => Ok(schedule),
            WriteOutcome::Rejected { conflicts } => Err(ApiError::ScheduleConflict { conflicts }),
        }
    }

    /// 更新课表
    pub fn update_schedule(
        &self,
        schedule_id: &str,
        payload: &SchedulePayload,
        force: bool,
    ) -> ApiResult<Schedule> {
        let input = Self::parse_payload(payload)?;
        match self.writer.update(schedule_id, &input, force)? {
            WriteOutcome::Persisted(schedule) => Ok(schedule),
            WriteOutcome::Rejected { conflicts } => Err(ApiError::ScheduleConflict { conflicts }),
        }
    }

    /// 取消课表
    pub fn cancel_schedule(&self, schedule_id: &str) -> ApiResult<Schedule> {
        Ok(self.writer.cancel(schedule_id)?)
    }

    /// 查询单条课表
    pub fn get_schedule(&self, schedule_id: &str) -> ApiResult<Option<Schedule>> {
        Ok(self.schedule_repo.find_by_id(schedule_id)?)
    }

    /// 查询学期课表快照 (不含已取消)
    pub fn list_schedules(&self, term: &str, year: i32) -> ApiResult<Vec<Schedule>> {
        Ok(self.schedule_repo.list_active(term, year)?)
    }

    /// 自动排课
    pub fn generate_schedules(&self, payload: &GeneratePayload) -> ApiResult<GenerationStats> {
        let mut working_hours = WorkingHours::default();
        if let Some(start) = &payload.working_start {
            working_hours.start_minutes = parse_hhmm(start)
                .ok_or_else(|| ApiError::InvalidInput(format!("无效的开始时间: {}", start)))?;
        }
        if let Some(end) = &payload.working_end {
            working_hours.end_minutes = parse_hhmm(end)
                .ok_or_else(|| ApiError::InvalidInput(format!("无效的结束时间: {}", end)))?;
        }

        let request = GenerationRequest {
            term: payload.term.clone(),
            year: payload.year,
            academic_year: payload.academic_year.clone(),
            working_hours,
            regenerate: payload.regenerate,
            save_to_database: payload.save_to_database,
            semester_start_date: payload.semester_start_date,
        };
        debug!(term = %request.term, year = request.year, "自动排课请求已受理");
        Ok(self.generator.generate(&request)?)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn parse_payload(payload: &SchedulePayload) -> ApiResult<ScheduleWriteInput> {
        let day_of_week = DayOfWeek::from_str(&payload.day_of_week)
            .ok_or_else(|| ApiError::InvalidInput(format!("无效的星期: {}", payload.day_of_week)))?;
        let start_minutes = parse_hhmm(&payload.start_time).ok_or_else(|| {
            ApiError::InvalidInput(format!("无效的开始时间: {}", payload.start_time))
        })?;
        let end_minutes = parse_hhmm(&payload.end_time).ok_or_else(|| {
            ApiError::InvalidInput(format!("无效的结束时间: {}", payload.end_time))
        })?;
        Ok(ScheduleWriteInput {
            course_id: payload.course_id.clone(),
            instructor_id: payload.instructor_id.clone(),
            room_id: payload.room_id.clone(),
            day_of_week,
            start_minutes,
            end_minutes,
            term: payload.term.clone(),
            year: payload.year,
            academic_year: payload.academic_year.clone(),
            schedule_date: payload.schedule_date,
        })
    }
}
