// ==========================================
// 教务排课系统 - 选课冲突检查引擎
// ==========================================
// 职责: 批量选课, 逐个学生独立判定时段冲突
// 红线: 单个学生的冲突绝不影响同批其他学生的成功选课
// ==========================================

use crate::domain::enrollment::{Enrollment, EnrollmentConflict};
use crate::domain::schedule::Schedule;
use crate::engine::conflict::{overlaps, same_occurrence};
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schedule_repo::ScheduleRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// EnrollmentChecker - 选课冲突检查引擎
// ==========================================
pub struct EnrollmentChecker {
    schedule_repo: Arc<ScheduleRepository>,
    enrollment_repo: Arc<EnrollmentRepository>,
}

impl EnrollmentChecker {
    /// 构造函数
    pub fn new(
        schedule_repo: Arc<ScheduleRepository>,
        enrollment_repo: Arc<EnrollmentRepository>,
    ) -> Self {
        Self {
            schedule_repo,
            enrollment_repo,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 批量选课
    ///
    /// # 参数
    /// - `student_ids`: 候选学生
    /// - `target_schedule_id`: 目标课表
    ///
    /// # 返回
    /// (成功创建的选课记录, 带原因的冲突清单)
    #[instrument(skip(self, student_ids), fields(
        schedule_id = %target_schedule_id,
        students = student_ids.len()
    ))]
    pub fn enroll_students(
        &self,
        student_ids: &[String],
        target_schedule_id: &str,
    ) -> RepositoryResult<(Vec<Enrollment>, Vec<EnrollmentConflict>)> {
        let target = self
            .schedule_repo
            .find_by_id(target_schedule_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: target_schedule_id.to_string(),
            })?;
        if !target.is_active() {
            return Err(RepositoryError::ValidationError(format!(
                "目标课表已取消: {}",
                target_schedule_id
            )));
        }

        let mut created = Vec::new();
        let mut conflicts = Vec::new();

        for student_id in student_ids {
            match self.check_student(student_id, &target)? {
                Some(reason) => {
                    conflicts.push(EnrollmentConflict {
                        student_id: student_id.clone(),
                        reason,
                    });
                }
                None => {
                    let enrollment = Enrollment {
                        enrollment_id: Uuid::new_v4().to_string(),
                        student_id: student_id.clone(),
                        course_id: target.course_id.clone(),
                        schedule_id: target.schedule_id.clone(),
                        instructor_id: target.instructor_id.clone(),
                        course_code: target.course_code.clone(),
                        course_name: target.course_name.clone(),
                        instructor_name: target.instructor_name.clone(),
                        created_at: Utc::now(),
                    };
                    match self.enrollment_repo.create(&enrollment) {
                        Ok(_) => created.push(enrollment),
                        // 存储层唯一约束兜底: 并发重复选课降级为冲突条目
                        Err(RepositoryError::UniqueConstraintViolation(_)) => {
                            conflicts.push(EnrollmentConflict {
                                student_id: student_id.clone(),
                                reason: format!(
                                    "already enrolled in {} ({})",
                                    target.course_code, target.course_name
                                ),
                            });
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        info!(created = created.len(), conflicts = conflicts.len(), "批量选课完成");
        Ok((created, conflicts))
    }

    // ==========================================
    // 内部方法
    // ==========================================

    /// 检查单个学生: 返回 Some(原因) 表示冲突
    fn check_student(
        &self,
        student_id: &str,
        target: &Schedule,
    ) -> RepositoryResult<Option<String>> {
        let existing = self.enrollment_repo.list_by_student(student_id)?;
        for enrollment in &existing {
            if enrollment.schedule_id == target.schedule_id {
                return Ok(Some(format!(
                    "already enrolled in {} ({})",
                    target.course_code, target.course_name
                )));
            }
            let other = match self.schedule_repo.find_by_id(&enrollment.schedule_id)? {
                Some(s) => s,
                // 课表行已被 regenerate 清理, 历史选课不再参与判定
                None => continue,
            };
            if Self::conflicts_with(target, &other) {
                return Ok(Some(format!(
                    "already enrolled in {} at overlapping time ({})",
                    other.course_code,
                    other.slot_label()
                )));
            }
        }
        Ok(None)
    }

    /// 同学期 + 同授课日 + 时段重叠 (与课表冲突检测同一判定规则)
    fn conflicts_with(target: &Schedule, other: &Schedule) -> bool {
        other.is_active()
            && other.term == target.term
            && other.year == target.year
            && same_occurrence(
                target.day_of_week,
                target.schedule_date,
                other.day_of_week,
                other.schedule_date,
            )
            && overlaps(
                target.start_minutes,
                target.end_minutes,
                other.start_minutes,
                other.end_minutes,
            )
    }
}
