// ==========================================
// 实体存储集成测试
// ==========================================
// 测试目标: 基础实体的增改删与存储层兜底约束
// 覆盖范围: 课程/教室/教师 CRUD / 可用时段入库校验 /
//           已发布周期行的唯一索引兜底
// ==========================================


use test_helpers::{make_course, make_instructor, make_room, setup, write_input};
use timetable_aps::domain::TimeWindow;
use timetable_aps::domain::types::DayOfWeek;
use timetable_aps::engine::WriteOutcome;
use timetable_aps::repository::error::RepositoryError;
use uuid::Uuid;

#[test]
fn test_course_update_and_delete_roundtrip() {
    let app = setup().unwrap();

    let mut course = make_course("CS101-1A", 1, "A", "First Term");
    app.course_repo.create(&course).unwrap();

    course.name = "数据结构".to_string();
    course.required_capacity = 55;
    app.course_repo.update(&course).unwrap();

    let reloaded = app
        .course_repo
        .find_by_id(&course.course_id)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.name, "数据结构");
    assert_eq!(reloaded.required_capacity, 55);

    app.course_repo.delete(&course.course_id).unwrap();
    assert!(app.course_repo.find_by_id(&course.course_id).unwrap().is_none());
}

#[test]
fn test_update_missing_course_reports_not_found() {
    let app = setup().unwrap();

    let course = make_course("CS999-1A", 1, "A", "First Term");
    let err = app.course_repo.update(&course).unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[test]
fn test_room_update_changes_are_visible() {
    let app = setup().unwrap();

    let mut room = make_room("101", 40);
    app.room_repo.create(&room).unwrap();

    room.capacity = 80;
    room.available = false;
    app.room_repo.update(&room).unwrap();

    let reloaded = app.room_repo.find_by_id(&room.room_id).unwrap().unwrap();
    assert_eq!(reloaded.capacity, 80);
    assert!(!reloaded.available);
    // 停用的教室不再出现在可用列表中
    assert!(app.room_repo.list_available().unwrap().is_empty());
}

#[test]
fn test_instructor_update_rejects_overlapping_windows() {
    let app = setup().unwrap();

    let mut instructor = make_instructor("张老师", 20);
    app.instructor_repo.create(&instructor).unwrap();

    instructor.availability.insert(
        DayOfWeek::Monday,
        vec![
            TimeWindow { start: 480, end: 620 },
            TimeWindow { start: 600, end: 720 },
        ],
    );
    let err = app.instructor_repo.update(&instructor).unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError(_)));

    // 畸形数据未入库, 原可用时段保持不变
    let reloaded = app
        .instructor_repo
        .find_by_id(&instructor.instructor_id)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.availability[&DayOfWeek::Monday].len(), 1);
}

#[test]
fn test_instructor_availability_survives_reload() {
    let app = setup().unwrap();

    let mut instructor = make_instructor("李老师", 18);
    instructor.availability.insert(
        DayOfWeek::Friday,
        vec![
            TimeWindow { start: 420, end: 600 },
            TimeWindow { start: 780, end: 1020 },
        ],
    );
    app.instructor_repo.create(&instructor).unwrap();
    instructor.max_hours_per_week = 16;
    app.instructor_repo.update(&instructor).unwrap();

    let reloaded = app
        .instructor_repo
        .find_by_id(&instructor.instructor_id)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.max_hours_per_week, 16);
    assert_eq!(reloaded.availability[&DayOfWeek::Friday].len(), 2);
    assert_eq!(reloaded.availability[&DayOfWeek::Friday][1].start, 780);
    assert_eq!(reloaded.specializations, instructor.specializations);
}

#[test]
fn test_published_slot_unique_index_backstop() {
    let app = setup().unwrap();

    let course = make_course("CS101-1A", 1, "A", "First Term");
    let room = make_room("101", 60);
    let instructor = make_instructor("张老师", 20);
    app.course_repo.create(&course).unwrap();
    app.room_repo.create(&room).unwrap();
    app.instructor_repo.create(&instructor).unwrap();

    let input = write_input(&course, &instructor, &room, DayOfWeek::Monday, 600, 690);
    let outcome = app.writer.create(&input, false).unwrap();
    let published = match outcome {
        WriteOutcome::Persisted(s) => s,
        WriteOutcome::Rejected { conflicts } => panic!("意外拒绝: {:?}", conflicts),
    };

    // 绕过引擎直接写重复的已发布周期行: 教室唯一索引兜底拦截
    let mut clone = published.clone();
    clone.schedule_id = Uuid::new_v4().to_string();
    clone.course_id = Uuid::new_v4().to_string();
    clone.instructor_id = Uuid::new_v4().to_string();
    let err = app.schedule_repo.create(&clone).unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));

    // 同一时段的带日期实例不受周期行唯一索引约束
    let mut dated = clone.clone();
    dated.schedule_id = Uuid::new_v4().to_string();
    dated.schedule_date = chrono::NaiveDate::from_ymd_opt(2025, 3, 10);
    app.schedule_repo.create(&dated).unwrap();
}

#[test]
fn test_enrollment_delete_releases_record() {
    let app = setup().unwrap();

    let course = make_course("CS101-1A", 1, "A", "First Term");
    let room = make_room("101", 60);
    let instructor = make_instructor("张老师", 20);
    app.course_repo.create(&course).unwrap();
    app.room_repo.create(&room).unwrap();
    app.instructor_repo.create(&instructor).unwrap();

    let input = write_input(&course, &instructor, &room, DayOfWeek::Monday, 600, 690);
    let schedule = match app.writer.create(&input, false).unwrap() {
        WriteOutcome::Persisted(s) => s,
        WriteOutcome::Rejected { conflicts } => panic!("意外拒绝: {:?}", conflicts),
    };

    let (created, conflicts) = app
        .checker
        .enroll_students(&["S-2024-001".to_string()], &schedule.schedule_id)
        .unwrap();
    assert_eq!(created.len(), 1);
    assert!(conflicts.is_empty());
    assert_eq!(
        app.enrollment_repo.count_by_schedule(&schedule.schedule_id).unwrap(),
        1
    );

    app.enrollment_repo.delete(&created[0].enrollment_id).unwrap();
    assert_eq!(
        app.enrollment_repo.count_by_schedule(&schedule.schedule_id).unwrap(),
        0
    );
    assert!(app.enrollment_repo.list_by_student("S-2024-001").unwrap().is_empty());
}
