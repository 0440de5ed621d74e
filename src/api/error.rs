// ==========================================
// 教务排课系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误分类, 转换Repository错误为用户友好的错误消息
// 分类: 校验错误 / 冲突错误 / 未找到 / 持久化错误 (持久化错误可重试)
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
///
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 校验错误 (输入缺失/畸形, 整体拒绝, 绝不部分生效)
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 冲突错误 (调用方可选择 force / 换时段 / 取消)
    // ==========================================
    #[error("排课冲突: {}", conflicts.join("; "))]
    ScheduleConflict { conflicts: Vec<String> },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 未找到 (原样上抛)
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 持久化错误 (存储层兜底约束或连接故障, 可整体重试)
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::UniqueConstraintViolation(msg)
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::SerializationError(msg) => {
                ApiError::InternalError(format!("序列化失败: {}", msg))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_includes_entity_and_id() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "Course".to_string(),
            id: "c-1".to_string(),
        }
        .into();
        assert!(err.to_string().contains("Course(id=c-1)"));
    }

    #[test]
    fn test_conflict_error_joins_reasons() {
        let err = ApiError::ScheduleConflict {
            conflicts: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "排课冲突: a; b");
    }
}
