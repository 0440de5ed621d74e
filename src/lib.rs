// ==========================================
// 教务排课系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 冲突检测 + 自动排课决策引擎 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    CourseKind, DayOfWeek, RequestStatus, RequestType, RoomKind, ScheduleStatus,
};

// 领域实体
pub use domain::{
    BorrowedInstance, Course, Enrollment, EnrollmentConflict, Instructor, Room, Schedule,
    ScheduleRequest, TimeWindow,
};

// 引擎
pub use engine::{
    AutoGenerator, BorrowWorkflow, ConflictDetector, EnrollmentChecker, GenerationRequest,
    GenerationStats, ScheduleWriter, WorkingHours, WriteOutcome,
};

// API
pub use api::{ApiError, ApiResult};

// ==========================================
// 全局常量
// ==========================================

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "教务排课系统";

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_defined() {
        assert!(!VERSION.is_empty());
        assert!(!APP_NAME.is_empty());
    }
}
