// ==========================================
// 教务排课系统 - 应用层
// ==========================================
// 职责: 装配仓储/引擎/API, 提供启动入口所需的共享状态
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
