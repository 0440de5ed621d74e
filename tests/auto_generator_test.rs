// ==========================================
// 自动排课引擎集成测试
// ==========================================
// 测试目标: 批量生成的搜索顺序、统计与幂等重跑
// 覆盖范围: 最小教室优先 / 午休跳过 / 试运行 / 重跑跳过 / regenerate
// ==========================================


use test_helpers::{make_course, make_instructor, make_room, setup};
use timetable_aps::domain::types::{DayOfWeek, ScheduleStatus};
use timetable_aps::engine::{GenerationRequest, WorkingHours};

fn generation_request(term: &str, save: bool, regenerate: bool) -> GenerationRequest {
    GenerationRequest {
        term: term.to_string(),
        year: 2024,
        academic_year: "2024-2025".to_string(),
        working_hours: WorkingHours::default(),
        regenerate,
        save_to_database: save,
        semester_start_date: None,
    }
}

#[test]
fn test_single_course_placed_monday_morning_in_smallest_fitting_room() {
    let app = setup().expect("setup failed");
    let course = make_course("CS101-1A", 1, "A", "First Term");
    app.course_repo.create(&course).unwrap();
    // 容量 30 不满足, 45 与 100 满足 -> 选 45
    app.room_repo.create(&make_room("小教室", 30)).unwrap();
    let fitting = make_room("中教室", 45);
    app.room_repo.create(&fitting).unwrap();
    app.room_repo.create(&make_room("大教室", 100)).unwrap();
    app.instructor_repo.create(&make_instructor("张老师", 20)).unwrap();

    let stats = app
        .generator
        .generate(&generation_request("First Term", true, false))
        .unwrap();

    assert_eq!(stats.total_courses, 1);
    assert_eq!(stats.scheduled_courses, 1);
    assert_eq!(stats.conflicts, 0);
    assert!(stats.skipped.is_empty());
    assert_eq!(stats.by_year_level.get(&1), Some(&1));

    let schedules = app.schedule_repo.list_active("First Term", 2024).unwrap();
    assert_eq!(schedules.len(), 1);
    let s = &schedules[0];
    // 第一个可行槽位: 周一 07:00-08:30
    assert_eq!(s.day_of_week, DayOfWeek::Monday);
    assert_eq!(s.start_minutes, 420);
    assert_eq!(s.end_minutes, 510);
    assert_eq!(s.status, ScheduleStatus::Published);
    assert_eq!(s.room_id, fitting.room_id);
    assert!(app
        .schedule_repo
        .exists_for_course(&course.course_id, "First Term", 2024)
        .unwrap());
}

#[test]
fn test_dry_run_writes_nothing() {
    let app = setup().expect("setup failed");
    app.course_repo
        .create(&make_course("CS101-1A", 1, "A", "First Term"))
        .unwrap();
    app.room_repo.create(&make_room("101", 60)).unwrap();
    app.instructor_repo.create(&make_instructor("张老师", 20)).unwrap();

    let stats = app
        .generator
        .generate(&generation_request("First Term", false, false))
        .unwrap();

    assert_eq!(stats.scheduled_courses, 1);
    assert!(app.schedule_repo.list_active("First Term", 2024).unwrap().is_empty());
}

#[test]
fn test_rerun_without_regenerate_skips_scheduled_courses() {
    let app = setup().expect("setup failed");
    app.course_repo
        .create(&make_course("CS101-1A", 1, "A", "First Term"))
        .unwrap();
    app.room_repo.create(&make_room("101", 60)).unwrap();
    app.instructor_repo.create(&make_instructor("张老师", 20)).unwrap();

    let first = app
        .generator
        .generate(&generation_request("First Term", true, false))
        .unwrap();
    let second = app
        .generator
        .generate(&generation_request("First Term", true, false))
        .unwrap();

    // 重跑不产生重复行, 统计维持不变
    assert_eq!(first.scheduled_courses, 1);
    assert_eq!(second.scheduled_courses, 1);
    assert!(second.skipped.is_empty());
    assert_eq!(app.schedule_repo.list_active("First Term", 2024).unwrap().len(), 1);
}

#[test]
fn test_regenerate_replaces_existing_rows() {
    let app = setup().expect("setup failed");
    app.course_repo
        .create(&make_course("CS101-1A", 1, "A", "First Term"))
        .unwrap();
    app.course_repo
        .create(&make_course("CS102-1B", 1, "B", "First Term"))
        .unwrap();
    app.room_repo.create(&make_room("101", 60)).unwrap();
    app.instructor_repo.create(&make_instructor("张老师", 40)).unwrap();

    app.generator
        .generate(&generation_request("First Term", true, false))
        .unwrap();
    let before: Vec<String> = app
        .schedule_repo
        .list_active("First Term", 2024)
        .unwrap()
        .iter()
        .map(|s| s.schedule_id.clone())
        .collect();

    let stats = app
        .generator
        .generate(&generation_request("First Term", true, true))
        .unwrap();

    let after = app.schedule_repo.list_active("First Term", 2024).unwrap();
    assert_eq!(stats.scheduled_courses, 2);
    assert_eq!(after.len(), 2);
    // 旧行被清空, 新行是全新 id
    for s in &after {
        assert!(!before.contains(&s.schedule_id));
    }
}

#[test]
fn test_unplaceable_course_is_skipped_with_reason() {
    let app = setup().expect("setup failed");
    let mut course = make_course("CS201-2A", 2, "A", "First Term");
    course.required_capacity = 200;
    app.course_repo.create(&course).unwrap();
    app.room_repo.create(&make_room("101", 60)).unwrap();
    app.instructor_repo.create(&make_instructor("张老师", 20)).unwrap();

    let stats = app
        .generator
        .generate(&generation_request("First Term", true, false))
        .unwrap();

    // 单门不可排不终止整批
    assert_eq!(stats.total_courses, 1);
    assert_eq!(stats.scheduled_courses, 0);
    assert_eq!(stats.skipped.len(), 1);
    assert!(stats.skipped[0].reason.contains("NO_ROOM_AVAILABLE"));
    assert!(app.schedule_repo.list_active("First Term", 2024).unwrap().is_empty());
}

#[test]
fn test_no_matching_instructor_is_reported() {
    let app = setup().expect("setup failed");
    let mut course = make_course("MATH101-1A", 1, "A", "First Term");
    course.department = "Mathematics".to_string();
    app.course_repo.create(&course).unwrap();
    app.room_repo.create(&make_room("101", 60)).unwrap();
    // 教师专业方向是 Computer Science, 不匹配
    app.instructor_repo.create(&make_instructor("张老师", 20)).unwrap();

    let stats = app
        .generator
        .generate(&generation_request("First Term", true, false))
        .unwrap();

    assert_eq!(stats.skipped.len(), 1);
    assert!(stats.skipped[0].reason.contains("NO_INSTRUCTOR_AVAILABLE"));
}

#[test]
fn test_same_section_courses_never_overlap() {
    let app = setup().expect("setup failed");
    // 同班级 (1-A) 两门课, 教室教师充足
    app.course_repo
        .create(&make_course("CS101-1A", 1, "A", "First Term"))
        .unwrap();
    app.course_repo
        .create(&make_course("CS103-1A", 1, "A", "First Term"))
        .unwrap();
    app.room_repo.create(&make_room("101", 60)).unwrap();
    app.room_repo.create(&make_room("102", 60)).unwrap();
    app.instructor_repo.create(&make_instructor("张老师", 40)).unwrap();
    app.instructor_repo.create(&make_instructor("李老师", 40)).unwrap();

    let stats = app
        .generator
        .generate(&generation_request("First Term", true, false))
        .unwrap();
    assert_eq!(stats.scheduled_courses, 2);

    let schedules = app.schedule_repo.list_active("First Term", 2024).unwrap();
    assert_eq!(schedules.len(), 2);
    let a = &schedules[0];
    let b = &schedules[1];
    let same_day = a.day_of_week == b.day_of_week;
    let overlapping = a.start_minutes < b.end_minutes && b.start_minutes < a.end_minutes;
    assert!(!(same_day && overlapping), "same section must not overlap");
}
