// ==========================================
// 教务排课系统 - 选课 API
// ==========================================
// 职责: 批量选课入口
// 约定: 目标课表可按 schedule_id 直指, 也可按 (course_id, term, year)
//       批量形式解析到该课程的现行课表
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::enrollment::{Enrollment, EnrollmentConflict};
use crate::engine::enroll::EnrollmentChecker;
use crate::repository::schedule_repo::ScheduleRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// 载荷定义
// ==========================================

/// 批量选课载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollPayload {
    /// 直指目标课表
    pub schedule_id: Option<String>,
    /// 批量形式: 按课程定位现行课表 (需同时给 term/year)
    pub course_id: Option<String>,
    pub term: Option<String>,
    pub year: Option<i32>,
    pub student_ids: Vec<String>,
}

/// 批量选课结果
#[derive(Debug, Clone, Serialize)]
pub struct EnrollResponse {
    pub created: Vec<Enrollment>,
    pub conflicts: Vec<EnrollmentConflict>,
}

// ==========================================
// EnrollmentApi - 选课 API
// ==========================================
pub struct EnrollmentApi {
    checker: Arc<EnrollmentChecker>,
    schedule_repo: Arc<ScheduleRepository>,
}

impl EnrollmentApi {
    /// 构造函数
    pub fn new(checker: Arc<EnrollmentChecker>, schedule_repo: Arc<ScheduleRepository>) -> Self {
        Self {
            checker,
            schedule_repo,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 批量选课
    ///
    /// 逐个学生独立判定, 单个冲突不影响同批其他学生
    pub fn enroll(&self, payload: &EnrollPayload) -> ApiResult<EnrollResponse> {
        if payload.student_ids.is_empty() {
            return Err(ApiError::InvalidInput("student_ids 不能为空".to_string()));
        }
        let schedule_id = self.resolve_schedule_id(payload)?;
        let (created, conflicts) = self
            .checker
            .enroll_students(&payload.student_ids, &schedule_id)?;
        Ok(EnrollResponse { created, conflicts })
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn resolve_schedule_id(&self, payload: &EnrollPayload) -> ApiResult<String> {
        if let Some(schedule_id) = &payload.schedule_id {
            return Ok(schedule_id.clone());
        }
        let (course_id, term, year) = match (&payload.course_id, &payload.term, payload.year) {
            (Some(course_id), Some(term), Some(year)) => (course_id, term, year),
            _ => {
                return Err(ApiError::InvalidInput(
                    "需要 schedule_id, 或 course_id + term + year".to_string(),
                ))
            }
        };
        let active = self.schedule_repo.list_active(term, year)?;
        active
            .iter()
            .find(|s| &s.course_id == course_id)
            .map(|s| s.schedule_id.clone())
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "课程 {} 在 {} {} 没有现行课表",
                    course_id, term, year
                ))
            })
    }
}
