// ==========================================
// 教务排课系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供外层 Web/桌面应用调用
// ==========================================

pub mod error;
pub mod schedule_api;
pub mod request_api;
pub mod enrollment_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use schedule_api::{GeneratePayload, ScheduleApi, SchedulePayload};
pub use request_api::{ApprovalResponse, BorrowRequestPayload, RequestApi};
pub use enrollment_api::{EnrollPayload, EnrollResponse, EnrollmentApi};
