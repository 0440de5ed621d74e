// ==========================================
// 教务排课系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod course_repo;
pub mod enrollment_repo;
pub mod error;
pub mod instructor_repo;
pub mod request_repo;
pub mod room_repo;
pub mod schedule_repo;

// 重导出核心仓储
pub use course_repo::CourseRepository;
pub use enrollment_repo::EnrollmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use instructor_repo::InstructorRepository;
pub use request_repo::ScheduleRequestRepository;
pub use room_repo::RoomRepository;
pub use schedule_repo::ScheduleRepository;

use chrono::{DateTime, NaiveDateTime, Utc};

/// 时间戳的统一存储格式
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 格式化时间戳为数据库字符串
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 从数据库字符串解析时间戳
pub(crate) fn parse_ts(col: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// 从 JSON 列解析集合/结构化字段
pub(crate) fn parse_json_col<T: serde::de::DeserializeOwned>(
    col: usize,
    s: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
    })
}
