// ==========================================
// 教务排课系统 - 选课仓储
// ==========================================

use crate::domain::enrollment::Enrollment;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_ts};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const COLUMNS: &str = "enrollment_id, student_id, course_id, schedule_id, instructor_id, \
     course_code, course_name, instructor_name, created_at";

// ==========================================
// EnrollmentRepository - 选课仓储
// ==========================================
pub struct EnrollmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnrollmentRepository {
    /// 创建新的EnrollmentRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建选课记录
    pub fn create(&self, enrollment: &Enrollment) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO enrollment (
                enrollment_id, student_id, course_id, schedule_id, instructor_id,
                course_code, course_name, instructor_name, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &enrollment.enrollment_id,
                &enrollment.student_id,
                &enrollment.course_id,
                &enrollment.schedule_id,
                &enrollment.instructor_id,
                &enrollment.course_code,
                &enrollment.course_name,
                &enrollment.instructor_name,
                format_ts(&enrollment.created_at),
            ],
        )?;

        Ok(enrollment.enrollment_id.clone())
    }

    /// 查询某学生的全部选课记录
    pub fn list_by_student(&self, student_id: &str) -> RepositoryResult<Vec<Enrollment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM enrollment WHERE student_id = ? ORDER BY created_at",
            COLUMNS
        ))?;

        let enrollments = stmt
            .query_map(params![student_id], Self::map_row)?
            .collect::<Result<Vec<Enrollment>, _>>()?;

        Ok(enrollments)
    }

    /// 查询某课表行的选课人数
    pub fn count_by_schedule(&self, schedule_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM enrollment WHERE schedule_id = ?",
            params![schedule_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// 删除选课记录
    pub fn delete(&self, enrollment_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM enrollment WHERE enrollment_id = ?",
            params![enrollment_id],
        )?;
        Ok(())
    }

    /// 映射数据库行到Enrollment对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Enrollment> {
        Ok(Enrollment {
            enrollment_id: row.get(0)?,
            student_id: row.get(1)?,
            course_id: row.get(2)?,
            schedule_id: row.get(3)?,
            instructor_id: row.get(4)?,
            course_code: row.get(5)?,
            course_name: row.get(6)?,
            instructor_name: row.get(7)?,
            created_at: parse_ts(8, &row.get::<_, String>(8)?)?,
        })
    }
}
