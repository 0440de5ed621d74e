// ==========================================
// 教务排课系统 - 教室实体
// ==========================================
// 职责: 教室主数据定义
// 约束: 容量与设备是排课硬约束
// ==========================================

use crate::domain::types::{CourseKind, RoomKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// Room - 教室主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub name: String,
    pub kind: RoomKind,
    pub capacity: i32,
    pub building: String,
    pub floor: i32,
    /// 设备集合 (如 "projector", "computers")
    pub equipment: BTreeSet<String>,
    /// 是否可用于排课
    pub available: bool,
}

impl Room {
    /// 容量与设备是否满足课程要求
    pub fn satisfies(&self, required_capacity: i32, required_equipment: &BTreeSet<String>) -> bool {
        self.capacity >= required_capacity && required_equipment.is_subset(&self.equipment)
    }

    /// 教室类型是否匹配课程类型
    ///
    /// 实验课匹配实验室/机房; 理论课与研讨课匹配普通教室/阶梯教室
    pub fn kind_matches(&self, course_kind: CourseKind) -> bool {
        match course_kind {
            CourseKind::Lab => {
                matches!(self.kind, RoomKind::Laboratory | RoomKind::ComputerLab)
            }
            CourseKind::Lecture | CourseKind::Seminar => {
                matches!(self.kind, RoomKind::Classroom | RoomKind::Auditorium)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(kind: RoomKind, capacity: i32, equipment: &[&str]) -> Room {
        Room {
            room_id: "r-1".to_string(),
            name: "Room 101".to_string(),
            kind,
            capacity,
            building: "主楼".to_string(),
            floor: 1,
            equipment: equipment.iter().map(|s| s.to_string()).collect(),
            available: true,
        }
    }

    #[test]
    fn test_satisfies_capacity_and_equipment() {
        let r = room(RoomKind::Classroom, 40, &["projector"]);
        let mut need = BTreeSet::new();
        assert!(r.satisfies(40, &need));
        assert!(!r.satisfies(41, &need));
        need.insert("projector".to_string());
        assert!(r.satisfies(30, &need));
        need.insert("computers".to_string());
        assert!(!r.satisfies(30, &need));
    }

    #[test]
    fn test_kind_matches() {
        assert!(room(RoomKind::ComputerLab, 30, &[]).kind_matches(CourseKind::Lab));
        assert!(!room(RoomKind::Classroom, 30, &[]).kind_matches(CourseKind::Lab));
        assert!(room(RoomKind::Auditorium, 100, &[]).kind_matches(CourseKind::Lecture));
        assert!(!room(RoomKind::Laboratory, 30, &[]).kind_matches(CourseKind::Seminar));
    }
}
