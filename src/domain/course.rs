// ==========================================
// 教务排课系统 - 课程实体
// ==========================================
// 职责: 课程主数据定义
// 约束: (year_level, section, term) 标识一个班级群体,
//       同一班级群体不可同时出现在两个重叠时段
// ==========================================

use crate::domain::types::CourseKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// Course - 课程主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    /// 课程代码 (每个开课实例唯一, 如 "CS101-1A")
    pub code: String,
    pub name: String,
    pub department: String,
    pub credits: i32,
    pub kind: CourseKind,
    /// 单次课时长 (分钟)
    pub duration_minutes: u16,
    /// 所需教室容量
    pub required_capacity: i32,
    /// 所需设备集合
    pub required_equipment: BTreeSet<String>,
    /// 年级 (1-4)
    pub year_level: i32,
    /// 班别 (如 "A")
    pub section: String,
    /// 学期 (如 "First Term")
    pub term: String,
    /// 指定授课教师 (可选; 自动排课优先使用)
    pub instructor_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// 班级群体键 (year_level + section + term)
    ///
    /// 同键课程的时段互斥
    pub fn section_key(&self) -> String {
        format!("{}-{}-{}", self.year_level, self.section, self.term)
    }

    /// 显示标签 (代码 + 名称), 供冲突原因与日志使用
    pub fn display_label(&self) -> String {
        format!("{} {}", self.code, self.name)
    }
}
