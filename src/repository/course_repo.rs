// ==========================================
// 教务排课系统 - 课程仓储
// ==========================================

use crate::domain::course::Course;
use crate::domain::types::CourseKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_json_col, parse_ts};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const COLUMNS: &str = "course_id, code, name, department, credits, kind, duration_minutes, \
     required_capacity, required_equipment, year_level, section, term, instructor_id, \
     created_at, updated_at";

// ==========================================
// CourseRepository - 课程仓储
// ==========================================
pub struct CourseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CourseRepository {
    /// 创建新的CourseRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建课程
    ///
    /// # 返回
    /// - `Ok(course_id)`: 成功
    /// - `Err`: 失败, 返回错误信息
    pub fn create(&self, course: &Course) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO course (
                course_id, code, name, department, credits, kind, duration_minutes,
                required_capacity, required_equipment, year_level, section, term,
                instructor_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &course.course_id,
                &course.code,
                &course.name,
                &course.department,
                course.credits,
                course.kind.to_db_str(),
                course.duration_minutes,
                course.required_capacity,
                serde_json::to_string(&course.required_equipment)?,
                course.year_level,
                &course.section,
                &course.term,
                &course.instructor_id,
                format_ts(&course.created_at),
                format_ts(&course.updated_at),
            ],
        )?;

        Ok(course.course_id.clone())
    }

    /// 按course_id查询课程
    ///
    /// # 返回
    /// - `Ok(Some(Course))`: 找到课程
    /// - `Ok(None)`: 未找到
    pub fn find_by_id(&self, course_id: &str) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("SELECT {} FROM course WHERE course_id = ?", COLUMNS),
            params![course_id],
            Self::map_row,
        ) {
            Ok(course) => Ok(Some(course)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询某学期某年度的全部课程 (自动排课的工作全集)
    ///
    /// # 返回
    /// - `Ok(Vec<Course>)`: 按年级、班别、代码排序
    pub fn list_by_term(&self, term: &str) -> RepositoryResult<Vec<Course>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM course WHERE term = ? ORDER BY year_level, section, code",
            COLUMNS
        ))?;

        let courses = stmt
            .query_map(params![term], Self::map_row)?
            .collect::<Result<Vec<Course>, _>>()?;

        Ok(courses)
    }

    /// 更新课程
    pub fn update(&self, course: &Course) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            r#"UPDATE course
               SET code = ?, name = ?, department = ?, credits = ?, kind = ?,
                   duration_minutes = ?, required_capacity = ?, required_equipment = ?,
                   year_level = ?, section = ?, term = ?, instructor_id = ?, updated_at = ?
               WHERE course_id = ?"#,
            params![
                &course.code,
                &course.name,
                &course.department,
                course.credits,
                course.kind.to_db_str(),
                course.duration_minutes,
                course.required_capacity,
                serde_json::to_string(&course.required_equipment)?,
                course.year_level,
                &course.section,
                &course.term,
                &course.instructor_id,
                format_ts(&course.updated_at),
                &course.course_id,
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Course".to_string(),
                id: course.course_id.clone(),
            });
        }

        Ok(())
    }

    /// 删除课程
    pub fn delete(&self, course_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM course WHERE course_id = ?", params![course_id])?;
        Ok(())
    }

    /// 映射数据库行到Course对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Course> {
        let kind_str: String = row.get(5)?;
        let kind = CourseKind::from_str(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("非法课程类型: {}", kind_str).into(),
            )
        })?;

        Ok(Course {
            course_id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            department: row.get(3)?,
            credits: row.get(4)?,
            kind,
            duration_minutes: row.get(6)?,
            required_capacity: row.get(7)?,
            required_equipment: parse_json_col(8, &row.get::<_, String>(8)?)?,
            year_level: row.get(9)?,
            section: row.get(10)?,
            term: row.get(11)?,
            instructor_id: row.get(12)?,
            created_at: parse_ts(13, &row.get::<_, String>(13)?)?,
            updated_at: parse_ts(14, &row.get::<_, String>(14)?)?,
        })
    }
}
