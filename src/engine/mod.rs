// ==========================================
// 教务排课系统 - 引擎层
// ==========================================
// 职责: 五大核心引擎 (冲突检测/课表写入/自动排课/借课流程/选课检查)
// 红线: Engine 不拼 SQL, 所有拒绝必须输出 reason
// ==========================================

pub mod borrow;
pub mod conflict;
pub mod enroll;
pub mod generator;
pub mod writer;

// 重导出核心引擎
pub use borrow::{ApprovalOutcome, BorrowRequestInput, BorrowWorkflow};
pub use conflict::{overlaps, same_occurrence, ConflictDetector, ScheduleCandidate};
pub use enroll::EnrollmentChecker;
pub use generator::{
    AutoGenerator, GenerationRequest, GenerationStats, SkippedCourse, WorkingHours,
};
pub use writer::{ScheduleWriteInput, ScheduleWriter, WriteOutcome};
