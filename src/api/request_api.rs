// ==========================================
// 教务排课系统 - 调课申请 API
// ==========================================
// 职责: 借课申请的创建/审批/驳回/查询入口
// 约定: 审批副作用全部在 BorrowWorkflow 内完成, API 层只做
//       载荷解析与结果包装
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::request::ScheduleRequest;
use crate::domain::schedule::Schedule;
use crate::domain::types::RequestStatus;
use crate::engine::borrow::{BorrowRequestInput, BorrowWorkflow};
use crate::repository::request_repo::ScheduleRequestRepository;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// 载荷定义
// ==========================================

/// 借课申请载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowRequestPayload {
    /// 代课教师
    pub instructor_id: String,
    /// 被借的源课表
    pub schedule_id: String,
    /// 借用的具体日期
    pub requested_date: NaiveDate,
    pub semester_start_date: Option<NaiveDate>,
}

/// 审批结果
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalResponse {
    pub request: ScheduleRequest,
    /// 派生的一次性课表行
    pub schedule: Schedule,
    /// 重试命中幂等守卫时为 true
    pub already_applied: bool,
}

// ==========================================
// RequestApi - 调课申请 API
// ==========================================
pub struct RequestApi {
    borrow: Arc<BorrowWorkflow>,
    request_repo: Arc<ScheduleRequestRepository>,
}

impl RequestApi {
    /// 构造函数
    pub fn new(borrow: Arc<BorrowWorkflow>, request_repo: Arc<ScheduleRequestRepository>) -> Self {
        Self {
            borrow,
            request_repo,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 创建借课申请 (预检冲突仅标记, 不阻止创建)
    pub fn create_borrow_request(
        &self,
        payload: &BorrowRequestPayload,
    ) -> ApiResult<ScheduleRequest> {
        let input = BorrowRequestInput {
            instructor_id: payload.instructor_id.clone(),
            schedule_id: payload.schedule_id.clone(),
            requested_date: payload.requested_date,
            semester_start_date: payload.semester_start_date,
        };
        Ok(self.borrow.create_request(&input)?)
    }

    /// 审批通过 (触发借课实例派生, 可安全重试)
    pub fn approve_request(
        &self,
        request_id: &str,
        review_note: Option<&str>,
    ) -> ApiResult<ApprovalResponse> {
        let outcome = self.borrow.approve(request_id, review_note)?;
        Ok(ApprovalResponse {
            request: outcome.request,
            schedule: outcome.derived_schedule,
            already_applied: outcome.already_applied,
        })
    }

    /// 领取审核 (PENDING -> UNDER_REVIEW, 终态拒绝)
    pub fn mark_under_review(&self, request_id: &str) -> ApiResult<ScheduleRequest> {
        self.request_repo
            .transition_status(request_id, RequestStatus::UnderReview, None)?;
        self.request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| ApiError::NotFound(format!("ScheduleRequest(id={})不存在", request_id)))
    }

    /// 驳回
    pub fn reject_request(
        &self,
        request_id: &str,
        review_note: Option<&str>,
    ) -> ApiResult<ScheduleRequest> {
        Ok(self.borrow.reject(request_id, review_note)?)
    }

    /// 按状态查询申请
    pub fn list_requests(&self, status: &str) -> ApiResult<Vec<ScheduleRequest>> {
        let status = RequestStatus::from_str(status)
            .ok_or_else(|| ApiError::InvalidInput(format!("无效的申请状态: {}", status)))?;
        Ok(self.request_repo.list_by_status(status)?)
    }
}
