// ==========================================
// 教务排课系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod course;
pub mod enrollment;
pub mod instructor;
pub mod request;
pub mod room;
pub mod schedule;
pub mod types;

// 重导出核心类型
pub use course::Course;
pub use enrollment::{Enrollment, EnrollmentConflict};
pub use instructor::{AvailabilityError, Instructor, TimeWindow};
pub use request::ScheduleRequest;
pub use room::Room;
pub use schedule::{BorrowedInstance, Schedule};
pub use types::{
    format_minutes, parse_hhmm, CourseKind, DayOfWeek, RequestStatus, RequestType, RoomKind,
    ScheduleStatus,
};
