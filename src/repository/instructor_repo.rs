// ==========================================
// 教务排课系统 - 教师仓储
// ==========================================
// 约束: 可用时段在写入边界校验 (有序且互不重叠),
//       畸形数据不得入库
// ==========================================

use crate::domain::instructor::Instructor;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_json_col;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const COLUMNS: &str = "instructor_id, name, max_hours_per_week, specializations, availability";

// ==========================================
// InstructorRepository - 教师仓储
// ==========================================
pub struct InstructorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InstructorRepository {
    /// 创建新的InstructorRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建教师
    ///
    /// 可用时段结构非法时拒绝写入
    pub fn create(&self, instructor: &Instructor) -> RepositoryResult<String> {
        instructor
            .validate_availability()
            .map_err(|e| RepositoryError::ValidationError(e.to_string()))?;

        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO instructor (
                instructor_id, name, max_hours_per_week, specializations, availability
            ) VALUES (?, ?, ?, ?, ?)"#,
            params![
                &instructor.instructor_id,
                &instructor.name,
                instructor.max_hours_per_week,
                serde_json::to_string(&instructor.specializations)?,
                serde_json::to_string(&instructor.availability)?,
            ],
        )?;

        Ok(instructor.instructor_id.clone())
    }

    /// 按instructor_id查询教师
    pub fn find_by_id(&self, instructor_id: &str) -> RepositoryResult<Option<Instructor>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("SELECT {} FROM instructor WHERE instructor_id = ?", COLUMNS),
            params![instructor_id],
            Self::map_row,
        ) {
            Ok(instructor) => Ok(Some(instructor)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部教师
    pub fn list_all(&self) -> RepositoryResult<Vec<Instructor>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM instructor ORDER BY name",
            COLUMNS
        ))?;

        let instructors = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<Instructor>, _>>()?;

        Ok(instructors)
    }

    /// 更新教师
    pub fn update(&self, instructor: &Instructor) -> RepositoryResult<()> {
        instructor
            .validate_availability()
            .map_err(|e| RepositoryError::ValidationError(e.to_string()))?;

        let conn = self.get_conn()?;

        let changed = conn.execute(
            r#"UPDATE instructor
               SET name = ?, max_hours_per_week = ?, specializations = ?, availability = ?
               WHERE instructor_id = ?"#,
            params![
                &instructor.name,
                instructor.max_hours_per_week,
                serde_json::to_string(&instructor.specializations)?,
                serde_json::to_string(&instructor.availability)?,
                &instructor.instructor_id,
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Instructor".to_string(),
                id: instructor.instructor_id.clone(),
            });
        }

        Ok(())
    }

    /// 映射数据库行到Instructor对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Instructor> {
        Ok(Instructor {
            instructor_id: row.get(0)?,
            name: row.get(1)?,
            max_hours_per_week: row.get(2)?,
            specializations: parse_json_col(3, &row.get::<_, String>(3)?)?,
            availability: parse_json_col(4, &row.get::<_, String>(4)?)?,
        })
    }
}
