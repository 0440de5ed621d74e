// ==========================================
// 教务排课系统 - 课表写入引擎
// ==========================================
// 职责: 单条课表创建/更新的 读取-校验-写入 序列
// 策略: 无冲突 -> PUBLISHED; 有冲突且 force=false -> 拒绝且不落库;
//       有冲突且 force=true -> CONFLICT 状态落库并保留冲突清单
// 红线: 拒绝路径零落库; 更新时排除自身旧行避免自我冲突
// ==========================================

use crate::domain::course::Course;
use crate::domain::instructor::Instructor;
use crate::domain::room::Room;
use crate::domain::schedule::Schedule;
use crate::domain::types::{DayOfWeek, ScheduleStatus};
use crate::engine::conflict::{ConflictDetector, ScheduleCandidate};
use crate::repository::course_repo::CourseRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::instructor_repo::InstructorRepository;
use crate::repository::room_repo::RoomRepository;
use crate::repository::schedule_repo::ScheduleRepository;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ScheduleWriteInput - 写入请求载荷
// ==========================================
#[derive(Debug, Clone)]
pub struct ScheduleWriteInput {
    pub course_id: String,
    pub instructor_id: String,
    pub room_id: String,
    pub day_of_week: DayOfWeek,
    pub start_minutes: u16,
    pub end_minutes: u16,
    pub term: String,
    pub year: i32,
    pub academic_year: String,
    /// 一次性日期; 为空表示周期性课表
    pub schedule_date: Option<NaiveDate>,
}

/// 写入结果: 落库成功, 或携带完整冲突清单的拒绝 (零落库)
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    Persisted(Schedule),
    Rejected { conflicts: Vec<String> },
}

// ==========================================
// ScheduleWriter - 课表写入引擎
// ==========================================
pub struct ScheduleWriter {
    course_repo: Arc<CourseRepository>,
    room_repo: Arc<RoomRepository>,
    instructor_repo: Arc<InstructorRepository>,
    schedule_repo: Arc<ScheduleRepository>,
    detector: ConflictDetector,
}

impl ScheduleWriter {
    /// 构造函数
    pub fn new(
        course_repo: Arc<CourseRepository>,
        room_repo: Arc<RoomRepository>,
        instructor_repo: Arc<InstructorRepository>,
        schedule_repo: Arc<ScheduleRepository>,
    ) -> Self {
        Self {
            course_repo,
            room_repo,
            instructor_repo,
            schedule_repo,
            detector: ConflictDetector::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 创建课表
    ///
    /// # 参数
    /// - `input`: 分配载荷
    /// - `force`: 冲突时是否强制落库 (CONFLICT 状态, 可审计)
    ///
    /// # 返回
    /// `WriteOutcome::Persisted` 或 `WriteOutcome::Rejected`
    #[instrument(skip(self, input), fields(
        course_id = %input.course_id,
        room_id = %input.room_id,
        instructor_id = %input.instructor_id,
        force = force
    ))]
    pub fn create(&self, input: &ScheduleWriteInput, force: bool) -> RepositoryResult<WriteOutcome> {
        Self::validate_input(input)?;
        let (course, room, instructor) = self.load_entities(input)?;

        let active = self.schedule_repo.list_active(&input.term, input.year)?;
        let candidate = Self::candidate(input, &course, &room, &instructor);
        let conflicts = self.detector.detect(&candidate, None, &active);

        if !conflicts.is_empty() && !force {
            warn!(course_code = %course.code, count = conflicts.len(), "检测到冲突, 拒绝创建");
            return Ok(WriteOutcome::Rejected { conflicts });
        }

        let mut schedule = Self::build_schedule(input, &course, &room, &instructor);
        if !conflicts.is_empty() {
            schedule.status = ScheduleStatus::Conflict;
            schedule.conflicts = conflicts;
        }
        self.schedule_repo.create(&schedule)?;
        info!(schedule_id = %schedule.schedule_id, status = ?schedule.status, "课表已创建");
        Ok(WriteOutcome::Persisted(schedule))
    }

    /// 更新课表
    ///
    /// 排除自身旧行后重新检测, 无操作编辑不会自我冲突;
    /// 借课关联字段与选课历史在更新中保持不变
    #[instrument(skip(self, input), fields(schedule_id = %schedule_id, force = force))]
    pub fn update(
        &self,
        schedule_id: &str,
        input: &ScheduleWriteInput,
        force: bool,
    ) -> RepositoryResult<WriteOutcome> {
        Self::validate_input(input)?;
        let existing = self
            .schedule_repo
            .find_by_id(schedule_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: schedule_id.to_string(),
            })?;
        let (course, room, instructor) = self.load_entities(input)?;

        let active = self.schedule_repo.list_active(&input.term, input.year)?;
        let candidate = Self::candidate(input, &course, &room, &instructor);
        let conflicts = self.detector.detect(&candidate, Some(schedule_id), &active);

        if !conflicts.is_empty() && !force {
            warn!(course_code = %course.code, count = conflicts.len(), "检测到冲突, 拒绝更新");
            return Ok(WriteOutcome::Rejected { conflicts });
        }

        let mut updated = Self::build_schedule(input, &course, &room, &instructor);
        updated.schedule_id = existing.schedule_id.clone();
        updated.created_at = existing.created_at;
        // 借课血缘只读透传
        updated.is_borrowed_instance = existing.is_borrowed_instance;
        updated.source_schedule_id = existing.source_schedule_id.clone();
        updated.borrow_request_id = existing.borrow_request_id.clone();
        updated.original_instructor_id = existing.original_instructor_id.clone();
        updated.original_instructor_name = existing.original_instructor_name.clone();
        updated.borrow_date = existing.borrow_date;
        updated.borrowed_instances = existing.borrowed_instances.clone();
        if !conflicts.is_empty() {
            updated.status = ScheduleStatus::Conflict;
            updated.conflicts = conflicts;
        }
        self.schedule_repo.update(&updated)?;
        info!(schedule_id = %updated.schedule_id, status = ?updated.status, "课表已更新");
        Ok(WriteOutcome::Persisted(updated))
    }

    /// 取消课表 (终态, 之后从所有冲突快照中剔除)
    #[instrument(skip(self), fields(schedule_id = %schedule_id))]
    pub fn cancel(&self, schedule_id: &str) -> RepositoryResult<Schedule> {
        let mut schedule = self
            .schedule_repo
            .find_by_id(schedule_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: schedule_id.to_string(),
            })?;
        schedule.status = ScheduleStatus::Canceled;
        schedule.updated_at = Utc::now();
        self.schedule_repo.update(&schedule)?;
        info!(schedule_id = %schedule.schedule_id, "课表已取消");
        Ok(schedule)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn validate_input(input: &ScheduleWriteInput) -> RepositoryResult<()> {
        if input.course_id.is_empty()
            || input.instructor_id.is_empty()
            || input.room_id.is_empty()
        {
            return Err(RepositoryError::ValidationError(
                "course_id/instructor_id/room_id 不能为空".to_string(),
            ));
        }
        if input.term.is_empty() || input.academic_year.is_empty() {
            return Err(RepositoryError::ValidationError(
                "term/academic_year 不能为空".to_string(),
            ));
        }
        if input.year <= 0 {
            return Err(RepositoryError::ValidationError(format!(
                "year 无效: {}",
                input.year
            )));
        }
        if input.end_minutes <= input.start_minutes {
            return Err(RepositoryError::ValidationError(format!(
                "结束时间必须晚于开始时间: start={} end={}",
                input.start_minutes, input.end_minutes
            )));
        }
        Ok(())
    }

    fn load_entities(
        &self,
        input: &ScheduleWriteInput,
    ) -> RepositoryResult<(Course, Room, Instructor)> {
        let course = self
            .course_repo
            .find_by_id(&input.course_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Course".to_string(),
                id: input.course_id.clone(),
            })?;
        let room = self
            .room_repo
            .find_by_id(&input.room_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Room".to_string(),
                id: input.room_id.clone(),
            })?;
        let instructor = self
            .instructor_repo
            .find_by_id(&input.instructor_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Instructor".to_string(),
                id: input.instructor_id.clone(),
            })?;
        Ok((course, room, instructor))
    }

    fn candidate<'a>(
        input: &ScheduleWriteInput,
        course: &'a Course,
        room: &'a Room,
        instructor: &'a Instructor,
    ) -> ScheduleCandidate<'a> {
        ScheduleCandidate {
            course,
            room,
            instructor,
            day_of_week: input.day_of_week,
            schedule_date: input.schedule_date,
            start_minutes: input.start_minutes,
            end_minutes: input.end_minutes,
        }
    }

    /// 组装新课表行, 同步刷新冗余显示字段
    fn build_schedule(
        input: &ScheduleWriteInput,
        course: &Course,
        room: &Room,
        instructor: &Instructor,
    ) -> Schedule {
        let now = Utc::now();
        Schedule {
            schedule_id: Uuid::new_v4().to_string(),
            course_id: course.course_id.clone(),
            instructor_id: instructor.instructor_id.clone(),
            room_id: room.room_id.clone(),
            day_of_week: input.day_of_week,
            start_minutes: input.start_minutes,
            end_minutes: input.end_minutes,
            term: input.term.clone(),
            year: input.year,
            academic_year: input.academic_year.clone(),
            status: ScheduleStatus::Published,
            conflicts: Vec::new(),
            schedule_date: input.schedule_date,
            is_borrowed_instance: false,
            source_schedule_id: None,
            borrow_request_id: None,
            original_instructor_id: None,
            original_instructor_name: None,
            borrow_date: None,
            borrowed_instances: Vec::new(),
            year_level: course.year_level,
            section: course.section.clone(),
            course_code: course.code.clone(),
            course_name: course.name.clone(),
            instructor_name: instructor.name.clone(),
            room_name: room.name.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ScheduleWriteInput {
        ScheduleWriteInput {
            course_id: "c-1".to_string(),
            instructor_id: "i-1".to_string(),
            room_id: "r-1".to_string(),
            day_of_week: DayOfWeek::Monday,
            start_minutes: 480,
            end_minutes: 570,
            term: "First Term".to_string(),
            year: 2024,
            academic_year: "2024-2025".to_string(),
            schedule_date: None,
        }
    }

    #[test]
    fn test_validate_rejects_inverted_time() {
        let mut bad = input();
        bad.start_minutes = 570;
        bad.end_minutes = 480;
        assert!(matches!(
            ScheduleWriter::validate_input(&bad),
            Err(RepositoryError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_missing_refs() {
        let mut bad = input();
        bad.course_id.clear();
        assert!(ScheduleWriter::validate_input(&bad).is_err());

        let mut bad = input();
        bad.term.clear();
        assert!(ScheduleWriter::validate_input(&bad).is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed_input() {
        assert!(ScheduleWriter::validate_input(&input()).is_ok());
    }
}
