// ==========================================
// 教务排课系统 - 借课流程引擎
// ==========================================
// 职责: 借课申请的创建 / 审批 / 驳回
// 状态机: PENDING -> (UNDER_REVIEW ->) APPROVED | REJECTED, 终态不可逆
// 红线: 创建时的冲突检测仅标记, 不阻止申请 (申请是观察不是承诺)
// 红线: 审批全链路幂等 —— 借课实例以 (源课表, 申请) 唯一,
//       中途失败后重试不会产生重复派生行
// ==========================================

use crate::domain::request::ScheduleRequest;
use crate::domain::schedule::{BorrowedInstance, Schedule};
use crate::domain::types::{DayOfWeek, RequestStatus, RequestType, ScheduleStatus};
use crate::engine::conflict::{ConflictDetector, ScheduleCandidate};
use crate::engine::generator::within_semester_window;
use crate::repository::course_repo::CourseRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::instructor_repo::InstructorRepository;
use crate::repository::request_repo::ScheduleRequestRepository;
use crate::repository::room_repo::RoomRepository;
use crate::repository::schedule_repo::ScheduleRepository;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// BorrowRequestInput - 借课申请载荷
// ==========================================
#[derive(Debug, Clone)]
pub struct BorrowRequestInput {
    /// 代课教师 (申请人)
    pub instructor_id: String,
    /// 被借的源课表
    pub schedule_id: String,
    /// 借用的具体日期
    pub requested_date: NaiveDate,
    /// 开学日; 提供时校验日期落在学期窗口内
    pub semester_start_date: Option<NaiveDate>,
}

/// 审批结果: 派生的一次性课表行 + 最终申请状态
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub derived_schedule: Schedule,
    pub request: ScheduleRequest,
    /// 重试路径上命中幂等守卫时为 true
    pub already_applied: bool,
}

// ==========================================
// BorrowWorkflow - 借课流程引擎
// ==========================================
pub struct BorrowWorkflow {
    course_repo: Arc<CourseRepository>,
    room_repo: Arc<RoomRepository>,
    instructor_repo: Arc<InstructorRepository>,
    schedule_repo: Arc<ScheduleRepository>,
    request_repo: Arc<ScheduleRequestRepository>,
    detector: ConflictDetector,
}

impl BorrowWorkflow {
    /// 构造函数
    pub fn new(
        course_repo: Arc<CourseRepository>,
        room_repo: Arc<RoomRepository>,
        instructor_repo: Arc<InstructorRepository>,
        schedule_repo: Arc<ScheduleRepository>,
        request_repo: Arc<ScheduleRequestRepository>,
    ) -> Self {
        Self {
            course_repo,
            room_repo,
            instructor_repo,
            schedule_repo,
            request_repo,
            detector: ConflictDetector::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 创建借课申请
    ///
    /// 以代课教师替换原教师, 对申请日期/时段/教室做一次预检,
    /// 结果写入 conflict_flag/conflicts 供审批人参考; 预检冲突
    /// 不阻止申请创建
    #[instrument(skip(self, input), fields(
        schedule_id = %input.schedule_id,
        instructor_id = %input.instructor_id,
        requested_date = %input.requested_date
    ))]
    pub fn create_request(&self, input: &BorrowRequestInput) -> RepositoryResult<ScheduleRequest> {
        let source = self.load_source_schedule(&input.schedule_id)?;
        let borrower = self
            .instructor_repo
            .find_by_id(&input.instructor_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Instructor".to_string(),
                id: input.instructor_id.clone(),
            })?;

        if DayOfWeek::from_date(input.requested_date) != source.day_of_week {
            return Err(RepositoryError::ValidationError(format!(
                "借用日期 {} 不是源课表的上课日 ({})",
                input.requested_date, source.day_of_week
            )));
        }
        if let Some(semester_start) = input.semester_start_date {
            if !within_semester_window(semester_start, input.requested_date) {
                return Err(RepositoryError::ValidationError(format!(
                    "借用日期 {} 超出学期窗口 (开学日 {})",
                    input.requested_date, semester_start
                )));
            }
        }

        let conflicts = self.detect_for_date(&source, &input.instructor_id, input.requested_date)?;
        if !conflicts.is_empty() {
            warn!(count = conflicts.len(), "借课申请预检发现冲突, 仅标记");
        }

        let now = Utc::now();
        let request = ScheduleRequest {
            request_id: Uuid::new_v4().to_string(),
            instructor_id: borrower.instructor_id.clone(),
            request_type: RequestType::BorrowSchedule,
            course_id: Some(source.course_id.clone()),
            schedule_id: Some(source.schedule_id.clone()),
            room_id: Some(source.room_id.clone()),
            requested_date: Some(input.requested_date),
            requested_day: Some(source.day_of_week),
            requested_start_minutes: Some(source.start_minutes),
            requested_end_minutes: Some(source.end_minutes),
            status: RequestStatus::Pending,
            conflict_flag: !conflicts.is_empty(),
            conflicts,
            review_note: None,
            instructor_name: borrower.name.clone(),
            course_code: Some(source.course_code.clone()),
            course_name: Some(source.course_name.clone()),
            room_name: Some(source.room_name.clone()),
            created_at: now,
            updated_at: now,
        };
        self.request_repo.create(&request)?;
        info!(request_id = %request.request_id, conflict_flag = request.conflict_flag, "借课申请已创建");
        Ok(request)
    }

    /// 审批通过
    ///
    /// 执行顺序 (每步幂等, 中途失败可整体重试):
    /// 1. 幂等守卫: 该 (源课表, 申请) 已有借课实例则跳过派生
    /// 2. 派生一次性课表行 (代课教师 + 具体日期 + 血缘字段)
    /// 3. 按具体日期重新检测, 有冲突则以 CONFLICT 状态落库
    /// 4. 源课表 borrowed_instances 追加一条 (同守卫防重)
    /// 5. 申请置为 APPROVED
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub fn approve(
        &self,
        request_id: &str,
        review_note: Option<&str>,
    ) -> RepositoryResult<ApprovalOutcome> {
        let request = self.load_request(request_id)?;
        if !request.is_borrow() {
            return Err(RepositoryError::ValidationError(format!(
                "申请类型不是借课: {}",
                request.request_type
            )));
        }
        if request.status.is_terminal() && request.status != RequestStatus::Approved {
            return Err(RepositoryError::InvalidStateTransition {
                from: request.status.to_string(),
                to: RequestStatus::Approved.to_string(),
            });
        }
        let source_id = request.schedule_id.clone().ok_or_else(|| {
            RepositoryError::ValidationError("借课申请缺少源课表".to_string())
        })?;
        let requested_date = request.requested_date.ok_or_else(|| {
            RepositoryError::ValidationError("借课申请缺少借用日期".to_string())
        })?;
        let mut source = self.load_source_schedule(&source_id)?;

        // 幂等守卫: 重试路径直接复用已派生行
        let (derived, already_applied) = match self
            .schedule_repo
            .find_borrowed_instance(&source_id, request_id)?
        {
            Some(existing) => {
                info!(schedule_id = %existing.schedule_id, "命中幂等守卫, 复用已派生借课实例");
                (existing, true)
            }
            None => {
                let conflicts =
                    self.detect_for_date(&source, &request.instructor_id, requested_date)?;
                let derived = self.build_derived_schedule(&source, &request, requested_date, conflicts)?;
                self.schedule_repo.create(&derived)?;
                info!(schedule_id = %derived.schedule_id, status = ?derived.status, "借课实例已落库");
                (derived, false)
            }
        };

        // 追加 borrowed_instances (同样以 request_id 防重)
        if !source.has_borrowed_instance_for(request_id) {
            source.borrowed_instances.push(BorrowedInstance {
                date: requested_date,
                request_id: request_id.to_string(),
                replacement_instructor_id: request.instructor_id.clone(),
                replacement_instructor_name: request.instructor_name.clone(),
            });
            self.schedule_repo
                .update_borrowed_instances(&source.schedule_id, &source.borrowed_instances)?;
        }

        if request.status != RequestStatus::Approved {
            self.request_repo
                .transition_status(request_id, RequestStatus::Approved, review_note)?;
        }
        let request = self.load_request(request_id)?;
        Ok(ApprovalOutcome {
            derived_schedule: derived,
            request,
            already_applied,
        })
    }

    /// 驳回 (终态, 无任何课表副作用)
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub fn reject(
        &self,
        request_id: &str,
        review_note: Option<&str>,
    ) -> RepositoryResult<ScheduleRequest> {
        self.request_repo
            .transition_status(request_id, RequestStatus::Rejected, review_note)?;
        info!("借课申请已驳回");
        self.load_request(request_id)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn load_request(&self, request_id: &str) -> RepositoryResult<ScheduleRequest> {
        self.request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ScheduleRequest".to_string(),
                id: request_id.to_string(),
            })
    }

    fn load_source_schedule(&self, schedule_id: &str) -> RepositoryResult<Schedule> {
        let schedule = self
            .schedule_repo
            .find_by_id(schedule_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: schedule_id.to_string(),
            })?;
        if !schedule.is_active() {
            return Err(RepositoryError::ValidationError(format!(
                "源课表已取消: {}",
                schedule_id
            )));
        }
        Ok(schedule)
    }

    /// 以代课教师替换原教师, 对指定具体日期做冲突检测
    ///
    /// 检测目标是"这一天": 带日期的候选只与同日期的其他行冲突,
    /// 源课表自身的周期行不参与 (日期优先于星期)
    fn detect_for_date(
        &self,
        source: &Schedule,
        borrower_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<String>> {
        let course = self
            .course_repo
            .find_by_id(&source.course_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Course".to_string(),
                id: source.course_id.clone(),
            })?;
        let room = self
            .room_repo
            .find_by_id(&source.room_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Room".to_string(),
                id: source.room_id.clone(),
            })?;
        let borrower = self
            .instructor_repo
            .find_by_id(borrower_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Instructor".to_string(),
                id: borrower_id.to_string(),
            })?;

        let active = self.schedule_repo.list_active(&source.term, source.year)?;
        let candidate = ScheduleCandidate {
            course: &course,
            room: &room,
            instructor: &borrower,
            day_of_week: source.day_of_week,
            schedule_date: Some(date),
            start_minutes: source.start_minutes,
            end_minutes: source.end_minutes,
        };
        Ok(self.detector.detect(&candidate, None, &active))
    }

    /// 派生一次性课表行: 拷贝源的课程/教室/时段, 换上代课教师,
    /// 固定到具体日期并带上血缘字段
    fn build_derived_schedule(
        &self,
        source: &Schedule,
        request: &ScheduleRequest,
        date: NaiveDate,
        conflicts: Vec<String>,
    ) -> RepositoryResult<Schedule> {
        let borrower = self
            .instructor_repo
            .find_by_id(&request.instructor_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Instructor".to_string(),
                id: request.instructor_id.clone(),
            })?;
        let now = Utc::now();
        let status = if conflicts.is_empty() {
            ScheduleStatus::Published
        } else {
            ScheduleStatus::Conflict
        };
        Ok(Schedule {
            schedule_id: Uuid::new_v4().to_string(),
            course_id: source.course_id.clone(),
            instructor_id: borrower.instructor_id.clone(),
            room_id: source.room_id.clone(),
            day_of_week: source.day_of_week,
            start_minutes: source.start_minutes,
            end_minutes: source.end_minutes,
            term: source.term.clone(),
            year: source.year,
            academic_year: source.academic_year.clone(),
            status,
            conflicts,
            schedule_date: Some(date),
            is_borrowed_instance: true,
            source_schedule_id: Some(source.schedule_id.clone()),
            borrow_request_id: Some(request.request_id.clone()),
            original_instructor_id: Some(source.instructor_id.clone()),
            original_instructor_name: Some(source.instructor_name.clone()),
            borrow_date: Some(date),
            borrowed_instances: Vec::new(),
            year_level: source.year_level,
            section: source.section.clone(),
            course_code: source.course_code.clone(),
            course_name: source.course_name.clone(),
            instructor_name: borrower.name.clone(),
            room_name: source.room_name.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}
