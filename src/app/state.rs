// ==========================================
// 教务排课系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{EnrollmentApi, RequestApi, ScheduleApi};
use crate::db;
use crate::engine::{
    AutoGenerator, BorrowWorkflow, EnrollmentChecker, ScheduleWriter,
};
use crate::repository::{
    course_repo::CourseRepository, enrollment_repo::EnrollmentRepository,
    instructor_repo::InstructorRepository, request_repo::ScheduleRequestRepository,
    room_repo::RoomRepository, schedule_repo::ScheduleRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 课表API (创建/更新/取消/自动排课)
    pub schedule_api: Arc<ScheduleApi>,

    /// 调课申请API (借课流程)
    pub request_api: Arc<RequestApi>,

    /// 选课API
    pub enrollment_api: Arc<EnrollmentApi>,

    // ===== 仓储直通 (查询场景) =====
    pub course_repo: Arc<CourseRepository>,
    pub room_repo: Arc<RoomRepository>,
    pub instructor_repo: Arc<InstructorRepository>,
    pub schedule_repo: Arc<ScheduleRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库连接并初始化表结构
    /// 2. 初始化所有Repository
    /// 3. 初始化所有Engine
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        db::init_schema(&conn).map_err(|e| format!("无法初始化表结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let course_repo = Arc::new(CourseRepository::new(conn.clone()));
        let room_repo = Arc::new(RoomRepository::new(conn.clone()));
        let instructor_repo = Arc::new(InstructorRepository::new(conn.clone()));
        let schedule_repo = Arc::new(ScheduleRepository::new(conn.clone()));
        let request_repo = Arc::new(ScheduleRequestRepository::new(conn.clone()));
        let enrollment_repo = Arc::new(EnrollmentRepository::new(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let writer = Arc::new(ScheduleWriter::new(
            course_repo.clone(),
            room_repo.clone(),
            instructor_repo.clone(),
            schedule_repo.clone(),
        ));
        let generator = Arc::new(AutoGenerator::new(
            course_repo.clone(),
            room_repo.clone(),
            instructor_repo.clone(),
            schedule_repo.clone(),
        ));
        let borrow = Arc::new(BorrowWorkflow::new(
            course_repo.clone(),
            room_repo.clone(),
            instructor_repo.clone(),
            schedule_repo.clone(),
            request_repo.clone(),
        ));
        let checker = Arc::new(EnrollmentChecker::new(
            schedule_repo.clone(),
            enrollment_repo.clone(),
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let schedule_api = Arc::new(ScheduleApi::new(
            writer,
            generator,
            schedule_repo.clone(),
        ));
        let request_api = Arc::new(RequestApi::new(borrow, request_repo));
        let enrollment_api = Arc::new(EnrollmentApi::new(checker, schedule_repo.clone()));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            schedule_api,
            request_api,
            enrollment_api,
            course_repo,
            room_repo,
            instructor_repo,
            schedule_repo,
        })
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("TIMETABLE_APS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 使用用户数据目录, 先给一个默认回退值, 拿到 data_dir 再覆盖
    let mut path = PathBuf::from("./timetable_aps.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录, 避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("timetable-aps-dev");
        }
        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("timetable-aps");
        }
        if let Err(e) = std::fs::create_dir_all(&path) {
            tracing::warn!("无法创建数据目录 {:?}: {}, 回退到当前目录", path, e);
            return "./timetable_aps.db".to_string();
        }
        path = path.join("timetable_aps.db");
    }

    path.to_string_lossy().to_string()
}
