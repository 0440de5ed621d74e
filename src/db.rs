// ==========================================
// 教务排课系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout, 减少并发写入时的偶发 busy 错误
// - 建表时落下唯一索引兜底: 冲突检测引擎是面向用户的快速预检,
//   存储层唯一约束才是并发窗口下的最终保证
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout (毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema (幂等)
///
/// 集合类字段 (设备/可用时段/冲突列表/借课记录) 以 JSON 文本存储
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS course (
            course_id TEXT PRIMARY KEY,
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            department TEXT NOT NULL,
            credits INTEGER NOT NULL,
            kind TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL,
            required_capacity INTEGER NOT NULL,
            required_equipment TEXT NOT NULL DEFAULT '[]',
            year_level INTEGER NOT NULL,
            section TEXT NOT NULL,
            term TEXT NOT NULL,
            instructor_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(code, term)
        );

        CREATE TABLE IF NOT EXISTS room (
            room_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            building TEXT NOT NULL,
            floor INTEGER NOT NULL,
            equipment TEXT NOT NULL DEFAULT '[]',
            available INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS instructor (
            instructor_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            max_hours_per_week INTEGER NOT NULL,
            specializations TEXT NOT NULL DEFAULT '[]',
            availability TEXT NOT NULL DEFAULT '{}'
        );

        CREATE TABLE IF NOT EXISTS schedule (
            schedule_id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL,
            instructor_id TEXT NOT NULL,
            room_id TEXT NOT NULL,
            day_of_week TEXT NOT NULL,
            start_minutes INTEGER NOT NULL,
            end_minutes INTEGER NOT NULL,
            term TEXT NOT NULL,
            year INTEGER NOT NULL,
            academic_year TEXT NOT NULL,
            status TEXT NOT NULL,
            conflicts TEXT NOT NULL DEFAULT '[]',
            schedule_date TEXT,
            is_borrowed_instance INTEGER NOT NULL DEFAULT 0,
            source_schedule_id TEXT,
            borrow_request_id TEXT,
            original_instructor_id TEXT,
            original_instructor_name TEXT,
            borrow_date TEXT,
            borrowed_instances TEXT NOT NULL DEFAULT '[]',
            year_level INTEGER NOT NULL,
            section TEXT NOT NULL,
            course_code TEXT NOT NULL DEFAULT '',
            course_name TEXT NOT NULL DEFAULT '',
            instructor_name TEXT NOT NULL DEFAULT '',
            room_name TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_schedule_term_year
            ON schedule(term, year);

        -- 存储层兜底唯一约束 (并发写入的最终防线):
        -- 同教室/同教师在同一学期同一星期同一起始时间只允许一条已发布周期行
        CREATE UNIQUE INDEX IF NOT EXISTS uq_schedule_room_slot
            ON schedule(room_id, day_of_week, start_minutes, term, year)
            WHERE status = 'PUBLISHED' AND schedule_date IS NULL;

        CREATE UNIQUE INDEX IF NOT EXISTS uq_schedule_instructor_slot
            ON schedule(instructor_id, day_of_week, start_minutes, term, year)
            WHERE status = 'PUBLISHED' AND schedule_date IS NULL;

        -- 借课兜底: 每个 (源课表, 申请) 至多一条借课实例
        CREATE UNIQUE INDEX IF NOT EXISTS uq_schedule_borrow_guard
            ON schedule(source_schedule_id, borrow_request_id)
            WHERE source_schedule_id IS NOT NULL AND borrow_request_id IS NOT NULL;

        CREATE TABLE IF NOT EXISTS schedule_request (
            request_id TEXT PRIMARY KEY,
            instructor_id TEXT NOT NULL,
            request_type TEXT NOT NULL,
            course_id TEXT,
            schedule_id TEXT,
            room_id TEXT,
            requested_date TEXT,
            requested_day TEXT,
            requested_start_minutes INTEGER,
            requested_end_minutes INTEGER,
            status TEXT NOT NULL,
            conflict_flag INTEGER NOT NULL DEFAULT 0,
            conflicts TEXT NOT NULL DEFAULT '[]',
            review_note TEXT,
            instructor_name TEXT NOT NULL DEFAULT '',
            course_code TEXT,
            course_name TEXT,
            room_name TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS enrollment (
            enrollment_id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            schedule_id TEXT NOT NULL,
            instructor_id TEXT NOT NULL,
            course_code TEXT NOT NULL DEFAULT '',
            course_name TEXT NOT NULL DEFAULT '',
            instructor_name TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            UNIQUE(student_id, schedule_id)
        );

        CREATE INDEX IF NOT EXISTS idx_enrollment_student
            ON enrollment(student_id);
        "#,
    )?;
    Ok(())
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        // 重复初始化不应报错
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('course','room','instructor','schedule','schedule_request','enrollment')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 6);
    }

    #[test]
    fn test_unique_backstop_blocks_double_booked_room() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let insert = |id: &str| {
            conn.execute(
                r#"INSERT INTO schedule (
                    schedule_id, course_id, instructor_id, room_id,
                    day_of_week, start_minutes, end_minutes,
                    term, year, academic_year, status,
                    year_level, section, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                rusqlite::params![
                    id, "c-1", "i-1", "r-1", "MONDAY", 600, 690, "First Term", 2024,
                    "2024-2025", "PUBLISHED", 1, "A", "2024-01-01 00:00:00",
                    "2024-01-01 00:00:00",
                ],
            )
        };

        insert("s-1").unwrap();
        // 同教室同时段第二条已发布行应被唯一索引拒绝
        assert!(insert("s-2").is_err());
    }
}
