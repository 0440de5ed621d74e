// ==========================================
// 教务排课系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 冲突检测 + 自动排课决策引擎
// ==========================================

use timetable_aps::app::{get_default_db_path, AppState};
use timetable_aps::logging;

fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 冲突检测与自动排课引擎", timetable_aps::APP_NAME);
    tracing::info!("系统版本: {}", timetable_aps::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("AppState初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("AppState初始化成功");
    tracing::info!("排课引擎就绪, 等待外层应用接入 (库模式: timetable_aps::app::AppState)");

    // 此可执行文件仅用于自检启动; 业务调用通过库 API 进行
    drop(app_state);
}
