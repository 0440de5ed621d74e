// ==========================================
// 选课冲突检查集成测试
// ==========================================
// 测试目标: 批量选课逐学生独立判定
// 覆盖范围: 时段冲突原因 / 重复选课 / 单学生冲突不阻塞同批
// ==========================================


use test_helpers::{make_course, make_instructor, make_room, setup, write_input, TestApp};
use timetable_aps::domain::Schedule;
use timetable_aps::domain::types::DayOfWeek;
use timetable_aps::engine::WriteOutcome;

/// 建两条互不冲突资源的课表: 周一 10:00-11:30 与给定时段
fn seed_two_schedules(app: &TestApp, day: DayOfWeek, start: u16, end: u16) -> (Schedule, Schedule) {
    let course_a = make_course("CS101-1A", 1, "A", "First Term");
    let course_b = make_course("CS102-2B", 2, "B", "First Term");
    let room_a = make_room("101", 60);
    let room_b = make_room("102", 60);
    let teacher_a = make_instructor("张老师", 20);
    let teacher_b = make_instructor("李老师", 20);
    app.course_repo.create(&course_a).unwrap();
    app.course_repo.create(&course_b).unwrap();
    app.room_repo.create(&room_a).unwrap();
    app.room_repo.create(&room_b).unwrap();
    app.instructor_repo.create(&teacher_a).unwrap();
    app.instructor_repo.create(&teacher_b).unwrap();

    let first = write_input(&course_a, &teacher_a, &room_a, DayOfWeek::Monday, 600, 690);
    let a = match app.writer.create(&first, false).unwrap() {
        WriteOutcome::Persisted(s) => s,
        WriteOutcome::Rejected { conflicts } => panic!("unexpected rejection: {:?}", conflicts),
    };
    let second = write_input(&course_b, &teacher_b, &room_b, day, start, end);
    let b = match app.writer.create(&second, false).unwrap() {
        WriteOutcome::Persisted(s) => s,
        WriteOutcome::Rejected { conflicts } => panic!("unexpected rejection: {:?}", conflicts),
    };
    (a, b)
}

#[test]
fn test_enroll_creates_records_for_free_students() {
    let app = setup().expect("setup failed");
    let (target, _) = seed_two_schedules(&app, DayOfWeek::Tuesday, 600, 690);

    let students = vec!["s-1".to_string(), "s-2".to_string()];
    let (created, conflicts) = app
        .checker
        .enroll_students(&students, &target.schedule_id)
        .unwrap();

    assert_eq!(created.len(), 2);
    assert!(conflicts.is_empty());
    assert_eq!(
        app.enrollment_repo.count_by_schedule(&target.schedule_id).unwrap(),
        2
    );
    assert_eq!(created[0].course_code, "CS101-1A");
}

#[test]
fn test_overlapping_enrollment_reported_with_reason() {
    let app = setup().expect("setup failed");
    // 第二门课周一 10:30-12:00, 与目标课重叠
    let (target, other) = seed_two_schedules(&app, DayOfWeek::Monday, 630, 720);

    // s-1 先选了重叠课
    let (created, conflicts) = app
        .checker
        .enroll_students(&["s-1".to_string()], &other.schedule_id)
        .unwrap();
    assert_eq!(created.len(), 1);
    assert!(conflicts.is_empty());

    let (created, conflicts) = app
        .checker
        .enroll_students(&["s-1".to_string()], &target.schedule_id)
        .unwrap();
    assert!(created.is_empty());
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].student_id, "s-1");
    assert!(conflicts[0].reason.contains("CS102-2B"));
    assert!(conflicts[0].reason.contains("overlapping time"));
}

#[test]
fn test_one_student_conflict_never_blocks_the_batch() {
    let app = setup().expect("setup failed");
    let (target, other) = seed_two_schedules(&app, DayOfWeek::Monday, 630, 720);

    // s-1 有重叠选课, s-2 空闲
    app.checker
        .enroll_students(&["s-1".to_string()], &other.schedule_id)
        .unwrap();

    let students = vec!["s-1".to_string(), "s-2".to_string()];
    let (created, conflicts) = app
        .checker
        .enroll_students(&students, &target.schedule_id)
        .unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(created[0].student_id, "s-2");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].student_id, "s-1");
}

#[test]
fn test_duplicate_enrollment_is_a_conflict() {
    let app = setup().expect("setup failed");
    let (target, _) = seed_two_schedules(&app, DayOfWeek::Tuesday, 600, 690);

    app.checker
        .enroll_students(&["s-1".to_string()], &target.schedule_id)
        .unwrap();
    let (created, conflicts) = app
        .checker
        .enroll_students(&["s-1".to_string()], &target.schedule_id)
        .unwrap();

    assert!(created.is_empty());
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].reason.contains("already enrolled"));
    assert_eq!(
        app.enrollment_repo.count_by_schedule(&target.schedule_id).unwrap(),
        1
    );
}

#[test]
fn test_adjacent_slots_do_not_block_enrollment() {
    let app = setup().expect("setup failed");
    // 第二门课周一 11:30-13:00, 与目标课紧邻
    let (target, other) = seed_two_schedules(&app, DayOfWeek::Monday, 690, 780);

    app.checker
        .enroll_students(&["s-1".to_string()], &other.schedule_id)
        .unwrap();
    let (created, conflicts) = app
        .checker
        .enroll_students(&["s-1".to_string()], &target.schedule_id)
        .unwrap();

    assert_eq!(created.len(), 1);
    assert!(conflicts.is_empty());
}
