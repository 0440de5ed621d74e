// ==========================================
// 教务排课系统 - 选课实体
// ==========================================
// 职责: 学生选课记录定义
// 约束: 仅当选课冲突检查通过才创建 (同学期时段不重叠)
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Enrollment - 选课记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub enrollment_id: String,
    pub student_id: String,
    pub course_id: String,
    pub schedule_id: String,
    pub instructor_id: String,

    // ===== 展示字段 (读缓存) =====
    pub course_code: String,
    pub course_name: String,
    pub instructor_name: String,

    pub created_at: DateTime<Utc>,
}

// ==========================================
// EnrollmentConflict - 单个学生的选课冲突
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentConflict {
    pub student_id: String,
    pub reason: String,
}
