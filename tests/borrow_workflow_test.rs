// ==========================================
// 借课流程集成测试
// ==========================================
// 测试目标: 申请创建的预检标记 + 审批幂等 + 驳回终态
// 覆盖范围: 借课实例派生 / borrowed_instances 追加 / 重试无重复
// ==========================================


use chrono::NaiveDate;
use test_helpers::{make_course, make_instructor, make_room, setup, write_input, TestApp};
use timetable_aps::domain::Schedule;
use timetable_aps::domain::types::{DayOfWeek, RequestStatus, ScheduleStatus};
use timetable_aps::engine::borrow::BorrowRequestInput;
use timetable_aps::engine::WriteOutcome;
use timetable_aps::repository::error::RepositoryError;

/// 建一条周一 10:00-11:30 的源课表, 返回 (源课表, 代课教师id)
fn seed_source_schedule(app: &TestApp) -> (Schedule, String) {
    let course = make_course("CS101-1A", 1, "A", "First Term");
    let room = make_room("101", 60);
    let original = make_instructor("原教师", 20);
    let borrower = make_instructor("代课教师", 20);
    app.course_repo.create(&course).unwrap();
    app.room_repo.create(&room).unwrap();
    app.instructor_repo.create(&original).unwrap();
    app.instructor_repo.create(&borrower).unwrap();

    let input = write_input(&course, &original, &room, DayOfWeek::Monday, 600, 690);
    let schedule = match app.writer.create(&input, false).unwrap() {
        WriteOutcome::Persisted(s) => s,
        WriteOutcome::Rejected { conflicts } => panic!("unexpected rejection: {:?}", conflicts),
    };
    (schedule, borrower.instructor_id)
}

#[test]
fn test_create_borrow_request_is_pending_with_advisory_precheck() {
    let app = setup().expect("setup failed");
    let (source, borrower_id) = seed_source_schedule(&app);

    // 2025-03-10 是周一
    let request = app
        .borrow
        .create_request(&BorrowRequestInput {
            instructor_id: borrower_id.clone(),
            schedule_id: source.schedule_id.clone(),
            requested_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            semester_start_date: None,
        })
        .unwrap();

    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.instructor_id, borrower_id);
    assert_eq!(request.schedule_id.as_deref(), Some(source.schedule_id.as_str()));
    assert_eq!(request.requested_start_minutes, Some(600));
    // 代课教师空闲, 预检无冲突
    assert!(!request.conflict_flag);
    assert!(request.conflicts.is_empty());
    // 申请创建不产生课表副作用
    assert_eq!(app.schedule_repo.list_active("First Term", 2024).unwrap().len(), 1);
}

#[test]
fn test_borrow_date_must_match_source_weekday() {
    let app = setup().expect("setup failed");
    let (source, borrower_id) = seed_source_schedule(&app);

    // 2025-03-11 是周二, 源课表在周一
    let result = app.borrow.create_request(&BorrowRequestInput {
        instructor_id: borrower_id,
        schedule_id: source.schedule_id,
        requested_date: NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
        semester_start_date: None,
    });
    assert!(matches!(result, Err(RepositoryError::ValidationError(_))));
}

#[test]
fn test_borrow_date_outside_semester_window_rejected() {
    let app = setup().expect("setup failed");
    let (source, borrower_id) = seed_source_schedule(&app);

    // 开学 2025-03-03, 窗口 98 天; 2025-06-30 (周一) 已越界
    let result = app.borrow.create_request(&BorrowRequestInput {
        instructor_id: borrower_id,
        schedule_id: source.schedule_id,
        requested_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        semester_start_date: NaiveDate::from_ymd_opt(2025, 3, 3),
    });
    assert!(matches!(result, Err(RepositoryError::ValidationError(_))));
}

#[test]
fn test_approval_derives_dated_instance_and_marks_source() {
    let app = setup().expect("setup failed");
    let (source, borrower_id) = seed_source_schedule(&app);
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let request = app
        .borrow
        .create_request(&BorrowRequestInput {
            instructor_id: borrower_id.clone(),
            schedule_id: source.schedule_id.clone(),
            requested_date: date,
            semester_start_date: None,
        })
        .unwrap();

    let outcome = app.borrow.approve(&request.request_id, Some("同意")).unwrap();
    assert!(!outcome.already_applied);
    assert_eq!(outcome.request.status, RequestStatus::Approved);

    let derived = &outcome.derived_schedule;
    assert_eq!(derived.status, ScheduleStatus::Published);
    assert!(derived.is_borrowed_instance);
    assert_eq!(derived.schedule_date, Some(date));
    assert_eq!(derived.instructor_id, borrower_id);
    assert_eq!(derived.source_schedule_id.as_deref(), Some(source.schedule_id.as_str()));
    assert_eq!(derived.borrow_request_id.as_deref(), Some(request.request_id.as_str()));
    assert_eq!(derived.original_instructor_id.as_deref(), Some(source.instructor_id.as_str()));
    // 拷贝源的课程/教室/时段
    assert_eq!(derived.room_id, source.room_id);
    assert_eq!(derived.start_minutes, 600);
    assert_eq!(derived.end_minutes, 690);

    // 源课表追加了借课标记
    let reloaded = app
        .schedule_repo
        .find_by_id(&source.schedule_id)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.borrowed_instances.len(), 1);
    assert_eq!(reloaded.borrowed_instances[0].request_id, request.request_id);
    assert_eq!(reloaded.borrowed_instances[0].date, date);

    // 快照: 源周期行 + 派生一次性行
    assert_eq!(app.schedule_repo.list_active("First Term", 2024).unwrap().len(), 2);
}

#[test]
fn test_approval_is_idempotent_on_retry() {
    let app = setup().expect("setup failed");
    let (source, borrower_id) = seed_source_schedule(&app);
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let request = app
        .borrow
        .create_request(&BorrowRequestInput {
            instructor_id: borrower_id,
            schedule_id: source.schedule_id.clone(),
            requested_date: date,
            semester_start_date: None,
        })
        .unwrap();

    let first = app.borrow.approve(&request.request_id, None).unwrap();
    let second = app.borrow.approve(&request.request_id, None).unwrap();

    // 重试命中幂等守卫: 复用同一派生行, 无重复
    assert!(second.already_applied);
    assert_eq!(
        second.derived_schedule.schedule_id,
        first.derived_schedule.schedule_id
    );
    assert_eq!(app.schedule_repo.list_active("First Term", 2024).unwrap().len(), 2);

    let reloaded = app
        .schedule_repo
        .find_by_id(&source.schedule_id)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.borrowed_instances.len(), 1);
}

#[test]
fn test_rejection_is_terminal_and_side_effect_free() {
    let app = setup().expect("setup failed");
    let (source, borrower_id) = seed_source_schedule(&app);

    let request = app
        .borrow
        .create_request(&BorrowRequestInput {
            instructor_id: borrower_id,
            schedule_id: source.schedule_id.clone(),
            requested_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            semester_start_date: None,
        })
        .unwrap();

    let rejected = app.borrow.reject(&request.request_id, Some("时间不合适")).unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.review_note.as_deref(), Some("时间不合适"));

    // 无课表副作用
    assert_eq!(app.schedule_repo.list_active("First Term", 2024).unwrap().len(), 1);

    // 终态不可再审批
    let result = app.borrow.approve(&request.request_id, None);
    assert!(matches!(
        result,
        Err(RepositoryError::InvalidStateTransition { .. })
    ));
}
