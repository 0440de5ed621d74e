// ==========================================
// 教务排课系统 - 自动排课引擎
// ==========================================
// 职责: 按学期批量生成课表 (教师 -> 教室 -> 日期/时段 三级搜索)
// 红线: 单门课不可排只记录跳过原因, 绝不中断整批
// 红线: 成功分配先在内存累积, 整批完成后一次性落库
// 红线: 同 (term, year) 的并发生成必须串行化
// ==========================================
// 搜索顺序: 首选课程声明的教师, 否则按专业方向匹配;
//           教室按容量升序 (最小可用优先, 减少浪费);
//           周一至周六 x 30分钟步进时段, 跳过午休窗口
// ==========================================

use crate::domain::course::Course;
use crate::domain::instructor::Instructor;
use crate::domain::room::Room;
use crate::domain::schedule::Schedule;
use crate::domain::types::{DayOfWeek, ScheduleStatus};
use crate::engine::conflict::{overlaps, ConflictDetector, ScheduleCandidate};
use crate::repository::course_repo::CourseRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::instructor_repo::InstructorRepository;
use crate::repository::room_repo::RoomRepository;
use crate::repository::schedule_repo::ScheduleRepository;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 排课参数常量
// ==========================================

/// 工作日: 周一至周六, 周日不排课
pub const WORKING_DAYS: [DayOfWeek; 6] = [
    DayOfWeek::Monday,
    DayOfWeek::Tuesday,
    DayOfWeek::Wednesday,
    DayOfWeek::Thursday,
    DayOfWeek::Friday,
    DayOfWeek::Saturday,
];

/// 默认上课开始 07:00
pub const DEFAULT_DAY_START_MINUTES: u16 = 7 * 60;
/// 默认上课结束 17:00
pub const DEFAULT_DAY_END_MINUTES: u16 = 17 * 60;
/// 时段步进 30 分钟
pub const SLOT_INCREMENT_MINUTES: u16 = 30;
/// 午休开始 12:00
pub const LUNCH_START_MINUTES: u16 = 12 * 60;
/// 午休结束 13:00 (周三 14:00)
pub const LUNCH_END_MINUTES: u16 = 13 * 60;
pub const WEDNESDAY_LUNCH_END_MINUTES: u16 = 14 * 60;
/// 学期窗口 14 周
pub const SEMESTER_WINDOW_DAYS: i64 = 98;

/// 时段是否撞上午休窗口
pub fn slot_overlaps_lunch(day: DayOfWeek, start: u16, end: u16) -> bool {
    let lunch_end = if day == DayOfWeek::Wednesday {
        WEDNESDAY_LUNCH_END_MINUTES
    } else {
        LUNCH_END_MINUTES
    };
    overlaps(start, end, LUNCH_START_MINUTES, lunch_end)
}

/// 日期是否落在学期窗口内 (开学日起 98 天)
pub fn within_semester_window(semester_start: NaiveDate, date: NaiveDate) -> bool {
    date >= semester_start && date < semester_start + Duration::days(SEMESTER_WINDOW_DAYS)
}

// ==========================================
// 生成请求与统计
// ==========================================

#[derive(Debug, Clone, Copy)]
pub struct WorkingHours {
    pub start_minutes: u16,
    pub end_minutes: u16,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start_minutes: DEFAULT_DAY_START_MINUTES,
            end_minutes: DEFAULT_DAY_END_MINUTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub term: String,
    pub year: i32,
    pub academic_year: String,
    pub working_hours: WorkingHours,
    /// 生成前删除该学期全部课表 (破坏性)
    pub regenerate: bool,
    /// false 为试运行: 只返回统计, 不写任何行
    pub save_to_database: bool,
    /// 开学日; 仅约束带具体日期的实例
    pub semester_start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedCourse {
    pub course_id: String,
    pub course_code: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    pub total_courses: usize,
    pub scheduled_courses: usize,
    /// 以 CONFLICT 状态落库的分配数 (引擎自检, 正常为 0)
    pub conflicts: usize,
    pub by_year_level: BTreeMap<i32, usize>,
    pub skipped: Vec<SkippedCourse>,
}

// ==========================================
// 每 (term, year) 生成锁注册表
// ==========================================
// 生成是 读多-写多 序列, 同键并发交错不安全, 必须串行

static GENERATION_LOCKS: OnceLock<Mutex<HashMap<String, Arc<Mutex<()>>>>> = OnceLock::new();

fn generation_lock(term: &str, year: i32) -> RepositoryResult<Arc<Mutex<()>>> {
    let registry = GENERATION_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut map = registry
        .lock()
        .map_err(|e| RepositoryError::LockError(format!("生成锁注册表获取失败: {}", e)))?;
    Ok(map
        .entry(format!("{}|{}", term, year))
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone())
}

// ==========================================
// AutoGenerator - 自动排课引擎
// ==========================================
pub struct AutoGenerator {
    course_repo: Arc<CourseRepository>,
    room_repo: Arc<RoomRepository>,
    instructor_repo: Arc<InstructorRepository>,
    schedule_repo: Arc<ScheduleRepository>,
    detector: ConflictDetector,
}

impl AutoGenerator {
    /// 构造函数
    pub fn new(
        course_repo: Arc<CourseRepository>,
        room_repo: Arc<RoomRepository>,
        instructor_repo: Arc<InstructorRepository>,
        schedule_repo: Arc<ScheduleRepository>,
    ) -> Self {
        Self {
            course_repo,
            room_repo,
            instructor_repo,
            schedule_repo,
            detector: ConflictDetector::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 为指定学期批量生成课表
    ///
    /// # 参数
    /// - `request`: 学期标识 + 工作时段 + 生成选项
    ///
    /// # 返回
    /// 生成统计 (总数/已排/冲突/分年级明细/跳过清单)
    #[instrument(skip(self, request), fields(
        term = %request.term,
        year = request.year,
        regenerate = request.regenerate,
        save = request.save_to_database
    ))]
    pub fn generate(&self, request: &GenerationRequest) -> RepositoryResult<GenerationStats> {
        Self::validate_request(request)?;

        let lock = generation_lock(&request.term, request.year)?;
        let _guard = lock
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("生成锁获取失败: {}", e)))?;

        if request.regenerate && request.save_to_database {
            let deleted = self.schedule_repo.delete_by_term(&request.term, request.year)?;
            info!(deleted = deleted, "重新生成: 已清空学期课表");
        }

        // working 既是冲突快照也是增量累加器: 每个成功分配立即加入,
        // 后续课程针对它检测, 无需末尾二次校验
        let mut working: Vec<Schedule> = if request.regenerate && !request.save_to_database {
            // 试运行的重新生成: 以空快照模拟清空, 不动库
            Vec::new()
        } else {
            self.schedule_repo.list_active(&request.term, request.year)?
        };

        let courses = self.course_repo.list_by_term(&request.term)?;
        let rooms = self.room_repo.list_available()?;
        let instructors = self.instructor_repo.list_all()?;

        let mut stats = GenerationStats {
            total_courses: courses.len(),
            ..Default::default()
        };
        let mut placed: Vec<Schedule> = Vec::new();

        for course in &courses {
            // 非重新生成模式下, 已有课表的课程保持原样
            if !request.regenerate
                && working
                    .iter()
                    .any(|s| s.course_id == course.course_id && s.is_active())
            {
                debug!(course_code = %course.code, "课程已有课表, 跳过重排");
                stats.scheduled_courses += 1;
                *stats.by_year_level.entry(course.year_level).or_insert(0) += 1;
                continue;
            }

            match self.place_course(course, &rooms, &instructors, &working, request) {
                Ok(schedule) => {
                    stats.scheduled_courses += 1;
                    *stats.by_year_level.entry(course.year_level).or_insert(0) += 1;
                    if schedule.status == ScheduleStatus::Conflict {
                        stats.conflicts += 1;
                    }
                    working.push(schedule.clone());
                    placed.push(schedule);
                }
                Err(reason) => {
                    warn!(course_code = %course.code, reason = %reason, "课程不可排, 跳过");
                    stats.skipped.push(SkippedCourse {
                        course_id: course.course_id.clone(),
                        course_code: course.code.clone(),
                        reason,
                    });
                }
            }
        }

        if request.save_to_database && !placed.is_empty() {
            self.schedule_repo.create_batch(&placed)?;
        }

        for (year_level, count) in &stats.by_year_level {
            info!(year_level = year_level, scheduled = count, "分年级排课明细");
        }
        info!(
            total = stats.total_courses,
            scheduled = stats.scheduled_courses,
            skipped = stats.skipped.len(),
            saved = request.save_to_database,
            "排课完成"
        );
        Ok(stats)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn validate_request(request: &GenerationRequest) -> RepositoryResult<()> {
        if request.term.is_empty() || request.academic_year.is_empty() {
            return Err(RepositoryError::ValidationError(
                "term/academic_year 不能为空".to_string(),
            ));
        }
        if request.year <= 0 {
            return Err(RepositoryError::ValidationError(format!(
                "year 无效: {}",
                request.year
            )));
        }
        let wh = &request.working_hours;
        if wh.end_minutes <= wh.start_minutes {
            return Err(RepositoryError::ValidationError(format!(
                "工作时段无效: start={} end={}",
                wh.start_minutes, wh.end_minutes
            )));
        }
        Ok(())
    }

    /// 为单门课程搜索 (教师, 教室, 日期, 时段) 组合
    ///
    /// 搜索空间有上界 (教师数 x 教室数 x 6天 x 时段格), 不可满足
    /// 的课程在遍历完后以原因字符串返回
    fn place_course(
        &self,
        course: &Course,
        rooms: &[Room],
        instructors: &[Instructor],
        working: &[Schedule],
        request: &GenerationRequest,
    ) -> Result<Schedule, String> {
        let candidate_instructors = Self::candidate_instructors(course, instructors);
        if candidate_instructors.is_empty() {
            return Err(format!(
                "NO_INSTRUCTOR_AVAILABLE: no instructor matches department {} for {}",
                course.department, course.code
            ));
        }

        // list_available 已按容量升序, 最小可用教室优先
        let candidate_rooms: Vec<&Room> = rooms
            .iter()
            .filter(|r| {
                r.kind_matches(course.kind)
                    && r.satisfies(course.required_capacity, &course.required_equipment)
            })
            .collect();
        if candidate_rooms.is_empty() {
            return Err(format!(
                "NO_ROOM_AVAILABLE: no room fits kind {:?}, capacity {}, equipment {:?}",
                course.kind, course.required_capacity, course.required_equipment
            ));
        }

        let wh = &request.working_hours;
        for &instructor in &candidate_instructors {
            for &room in &candidate_rooms {
                for day in WORKING_DAYS {
                    let mut start = wh.start_minutes;
                    while start + course.duration_minutes <= wh.end_minutes {
                        let end = start + course.duration_minutes;
                        if slot_overlaps_lunch(day, start, end) {
                            start += SLOT_INCREMENT_MINUTES;
                            continue;
                        }
                        let candidate = ScheduleCandidate {
                            course,
                            room,
                            instructor,
                            day_of_week: day,
                            schedule_date: None,
                            start_minutes: start,
                            end_minutes: end,
                        };
                        if self.detector.detect(&candidate, None, working).is_empty() {
                            return Ok(Self::build_schedule(
                                course, room, instructor, day, start, end, request,
                            ));
                        }
                        start += SLOT_INCREMENT_MINUTES;
                    }
                }
            }
        }

        Err(format!(
            "NO_FREE_SLOT: no conflict-free (instructor, room, day, time) found for {}",
            course.code
        ))
    }

    /// 候选教师: 课程声明的教师优先, 其后按专业方向匹配
    fn candidate_instructors<'a>(
        course: &Course,
        instructors: &'a [Instructor],
    ) -> Vec<&'a Instructor> {
        let mut candidates: Vec<&Instructor> = Vec::new();
        if let Some(declared_id) = &course.instructor_id {
            if let Some(declared) = instructors
                .iter()
                .find(|i| &i.instructor_id == declared_id)
            {
                candidates.push(declared);
            }
        }
        for instructor in instructors {
            if candidates
                .iter()
                .any(|c| c.instructor_id == instructor.instructor_id)
            {
                continue;
            }
            if instructor.specializations.contains(&course.department)
                || instructor
                    .specializations
                    .contains(course.kind.to_db_str())
            {
                candidates.push(instructor);
            }
        }
        candidates
    }

    fn build_schedule(
        course: &Course,
        room: &Room,
        instructor: &Instructor,
        day: DayOfWeek,
        start: u16,
        end: u16,
        request: &GenerationRequest,
    ) -> Schedule {
        let now = Utc::now();
        Schedule {
            schedule_id: Uuid::new_v4().to_string(),
            course_id: course.course_id.clone(),
            instructor_id: instructor.instructor_id.clone(),
            room_id: room.room_id.clone(),
            day_of_week: day,
            start_minutes: start,
            end_minutes: end,
            term: request.term.clone(),
            year: request.year,
            academic_year: request.academic_year.clone(),
            status: ScheduleStatus::Published,
            conflicts: Vec::new(),
            schedule_date: None,
            is_borrowed_instance: false,
            source_schedule_id: None,
            borrow_request_id: None,
            original_instructor_id: None,
            original_instructor_name: None,
            borrow_date: None,
            borrowed_instances: Vec::new(),
            year_level: course.year_level,
            section: course.section.clone(),
            course_code: course.code.clone(),
            course_name: course.name.clone(),
            instructor_name: instructor.name.clone(),
            room_name: room.name.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}
