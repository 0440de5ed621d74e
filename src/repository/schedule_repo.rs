// ==========================================
// 教务排课系统 - 课表仓储
// ==========================================
// 约束: 快照查询 (list_active) 是冲突检测的唯一数据入口,
//       已取消行一律排除
// ==========================================

use crate::domain::schedule::{BorrowedInstance, Schedule};
use crate::domain::types::{DayOfWeek, ScheduleStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_json_col, parse_ts};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const COLUMNS: &str = "schedule_id, course_id, instructor_id, room_id, day_of_week, \
     start_minutes, end_minutes, term, year, academic_year, status, conflicts, \
     schedule_date, is_borrowed_instance, source_schedule_id, borrow_request_id, \
     original_instructor_id, original_instructor_name, borrow_date, borrowed_instances, \
     year_level, section, course_code, course_name, instructor_name, room_name, \
     created_at, updated_at";

// ==========================================
// ScheduleRepository - 课表仓储
// ==========================================
pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    /// 创建新的ScheduleRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建课表行
    pub fn create(&self, schedule: &Schedule) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_one(&conn, schedule)?;
        Ok(schedule.schedule_id.clone())
    }

    /// 批量创建课表行 (单事务)
    ///
    /// 自动排课的落库入口: 整批成功或整批失败, 不留半截结果
    pub fn create_batch(&self, schedules: &[Schedule]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;

        for schedule in schedules {
            Self::insert_one(&tx, schedule)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;
        Ok(schedules.len())
    }

    fn insert_one(conn: &Connection, schedule: &Schedule) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO schedule (
                schedule_id, course_id, instructor_id, room_id, day_of_week,
                start_minutes, end_minutes, term, year, academic_year, status, conflicts,
                schedule_date, is_borrowed_instance, source_schedule_id, borrow_request_id,
                original_instructor_id, original_instructor_name, borrow_date,
                borrowed_instances, year_level, section, course_code, course_name,
                instructor_name, room_name, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &schedule.schedule_id,
                &schedule.course_id,
                &schedule.instructor_id,
                &schedule.room_id,
                schedule.day_of_week.to_db_str(),
                schedule.start_minutes,
                schedule.end_minutes,
                &schedule.term,
                schedule.year,
                &schedule.academic_year,
                schedule.status.to_db_str(),
                serde_json::to_string(&schedule.conflicts)?,
                schedule.schedule_date,
                schedule.is_borrowed_instance,
                &schedule.source_schedule_id,
                &schedule.borrow_request_id,
                &schedule.original_instructor_id,
                &schedule.original_instructor_name,
                schedule.borrow_date,
                serde_json::to_string(&schedule.borrowed_instances)?,
                schedule.year_level,
                &schedule.section,
                &schedule.course_code,
                &schedule.course_name,
                &schedule.instructor_name,
                &schedule.room_name,
                format_ts(&schedule.created_at),
                format_ts(&schedule.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 按schedule_id查询课表行
    pub fn find_by_id(&self, schedule_id: &str) -> RepositoryResult<Option<Schedule>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("SELECT {} FROM schedule WHERE schedule_id = ?", COLUMNS),
            params![schedule_id],
            Self::map_row,
        ) {
            Ok(schedule) => Ok(Some(schedule)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询学期快照: 指定 (term, year) 的全部非取消课表行
    ///
    /// 冲突检测的唯一数据入口
    pub fn list_active(&self, term: &str, year: i32) -> RepositoryResult<Vec<Schedule>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM schedule
             WHERE term = ? AND year = ? AND status != 'CANCELED'
             ORDER BY day_of_week, start_minutes",
            COLUMNS
        ))?;

        let schedules = stmt
            .query_map(params![term, year], Self::map_row)?
            .collect::<Result<Vec<Schedule>, _>>()?;

        Ok(schedules)
    }

    /// 某课程在指定 (term, year) 是否已有非取消课表行
    ///
    /// 非 regenerate 模式下重复生成时用于跳过已排课程
    pub fn exists_for_course(
        &self,
        course_id: &str,
        term: &str,
        year: i32,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM schedule
             WHERE course_id = ? AND term = ? AND year = ? AND status != 'CANCELED'",
            params![course_id, term, year],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// 更新课表行 (整行覆盖)
    pub fn update(&self, schedule: &Schedule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            r#"UPDATE schedule
               SET course_id = ?, instructor_id = ?, room_id = ?, day_of_week = ?,
                   start_minutes = ?, end_minutes = ?, term = ?, year = ?,
                   academic_year = ?, status = ?, conflicts = ?, schedule_date = ?,
                   is_borrowed_instance = ?, source_schedule_id = ?, borrow_request_id = ?,
                   original_instructor_id = ?, original_instructor_name = ?, borrow_date = ?,
                   borrowed_instances = ?, year_level = ?, section = ?, course_code = ?,
                   course_name = ?, instructor_name = ?, room_name = ?, updated_at = ?
               WHERE schedule_id = ?"#,
            params![
                &schedule.course_id,
                &schedule.instructor_id,
                &schedule.room_id,
                schedule.day_of_week.to_db_str(),
                schedule.start_minutes,
                schedule.end_minutes,
                &schedule.term,
                schedule.year,
                &schedule.academic_year,
                schedule.status.to_db_str(),
                serde_json::to_string(&schedule.conflicts)?,
                schedule.schedule_date,
                schedule.is_borrowed_instance,
                &schedule.source_schedule_id,
                &schedule.borrow_request_id,
                &schedule.original_instructor_id,
                &schedule.original_instructor_name,
                schedule.borrow_date,
                serde_json::to_string(&schedule.borrowed_instances)?,
                schedule.year_level,
                &schedule.section,
                &schedule.course_code,
                &schedule.course_name,
                &schedule.instructor_name,
                &schedule.room_name,
                format_ts(&schedule.updated_at),
                &schedule.schedule_id,
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: schedule.schedule_id.clone(),
            });
        }

        Ok(())
    }

    /// 仅更新源课表行的借课记录列表
    pub fn update_borrowed_instances(
        &self,
        schedule_id: &str,
        instances: &[BorrowedInstance],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            "UPDATE schedule SET borrowed_instances = ?, updated_at = datetime('now')
             WHERE schedule_id = ?",
            params![serde_json::to_string(instances)?, schedule_id],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: schedule_id.to_string(),
            });
        }

        Ok(())
    }

    /// 查询指定 (源课表, 申请) 的借课实例 (审批重试的幂等守卫)
    pub fn find_borrowed_instance(
        &self,
        source_schedule_id: &str,
        request_id: &str,
    ) -> RepositoryResult<Option<Schedule>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                "SELECT {} FROM schedule
                 WHERE source_schedule_id = ? AND borrow_request_id = ?",
                COLUMNS
            ),
            params![source_schedule_id, request_id],
            Self::map_row,
        ) {
            Ok(schedule) => Ok(Some(schedule)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 删除指定 (term, year) 的全部课表行 (regenerate 模式)
    ///
    /// # 返回
    /// - `Ok(count)`: 删除的行数
    pub fn delete_by_term(&self, term: &str, year: i32) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let count = conn.execute(
            "DELETE FROM schedule WHERE term = ? AND year = ?",
            params![term, year],
        )?;

        Ok(count)
    }

    /// 映射数据库行到Schedule对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Schedule> {
        let day_str: String = row.get(4)?;
        let day_of_week = DayOfWeek::from_str(&day_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("非法星期: {}", day_str).into(),
            )
        })?;

        let status_str: String = row.get(10)?;
        let status = ScheduleStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                10,
                rusqlite::types::Type::Text,
                format!("非法课表状态: {}", status_str).into(),
            )
        })?;

        Ok(Schedule {
            schedule_id: row.get(0)?,
            course_id: row.get(1)?,
            instructor_id: row.get(2)?,
            room_id: row.get(3)?,
            day_of_week,
            start_minutes: row.get(5)?,
            end_minutes: row.get(6)?,
            term: row.get(7)?,
            year: row.get(8)?,
            academic_year: row.get(9)?,
            status,
            conflicts: parse_json_col(11, &row.get::<_, String>(11)?)?,
            schedule_date: row.get::<_, Option<NaiveDate>>(12)?,
            is_borrowed_instance: row.get(13)?,
            source_schedule_id: row.get(14)?,
            borrow_request_id: row.get(15)?,
            original_instructor_id: row.get(16)?,
            original_instructor_name: row.get(17)?,
            borrow_date: row.get::<_, Option<NaiveDate>>(18)?,
            borrowed_instances: parse_json_col(19, &row.get::<_, String>(19)?)?,
            year_level: row.get(20)?,
            section: row.get(21)?,
            course_code: row.get(22)?,
            course_name: row.get(23)?,
            instructor_name: row.get(24)?,
            room_name: row.get(25)?,
            created_at: parse_ts(26, &row.get::<_, String>(26)?)?,
            updated_at: parse_ts(27, &row.get::<_, String>(27)?)?,
        })
    }
}
