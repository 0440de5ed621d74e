// ==========================================
// 教务排课系统 - 调课申请仓储
// ==========================================
// 约束: 状态转移由仓储校验合法性, 终态行不可再改
// ==========================================

use crate::domain::request::ScheduleRequest;
use crate::domain::types::{DayOfWeek, RequestStatus, RequestType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_json_col, parse_ts};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const COLUMNS: &str = "request_id, instructor_id, request_type, course_id, schedule_id, \
     room_id, requested_date, requested_day, requested_start_minutes, \
     requested_end_minutes, status, conflict_flag, conflicts, review_note, \
     instructor_name, course_code, course_name, room_name, created_at, updated_at";

// ==========================================
// ScheduleRequestRepository - 调课申请仓储
// ==========================================
pub struct ScheduleRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRequestRepository {
    /// 创建新的ScheduleRequestRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建申请
    pub fn create(&self, request: &ScheduleRequest) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO schedule_request (
                request_id, instructor_id, request_type, course_id, schedule_id, room_id,
                requested_date, requested_day, requested_start_minutes,
                requested_end_minutes, status, conflict_flag, conflicts, review_note,
                instructor_name, course_code, course_name, room_name, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &request.request_id,
                &request.instructor_id,
                request.request_type.to_db_str(),
                &request.course_id,
                &request.schedule_id,
                &request.room_id,
                request.requested_date,
                request.requested_day.map(|d| d.to_db_str()),
                request.requested_start_minutes,
                request.requested_end_minutes,
                request.status.to_db_str(),
                request.conflict_flag,
                serde_json::to_string(&request.conflicts)?,
                &request.review_note,
                &request.instructor_name,
                &request.course_code,
                &request.course_name,
                &request.room_name,
                format_ts(&request.created_at),
                format_ts(&request.updated_at),
            ],
        )?;

        Ok(request.request_id.clone())
    }

    /// 按request_id查询申请
    pub fn find_by_id(&self, request_id: &str) -> RepositoryResult<Option<ScheduleRequest>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                "SELECT {} FROM schedule_request WHERE request_id = ?",
                COLUMNS
            ),
            params![request_id],
            Self::map_row,
        ) {
            Ok(request) => Ok(Some(request)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按状态查询申请
    pub fn list_by_status(&self, status: RequestStatus) -> RepositoryResult<Vec<ScheduleRequest>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM schedule_request WHERE status = ? ORDER BY created_at",
            COLUMNS
        ))?;

        let requests = stmt
            .query_map(params![status.to_db_str()], Self::map_row)?
            .collect::<Result<Vec<ScheduleRequest>, _>>()?;

        Ok(requests)
    }

    /// 状态转移 (带合法性校验)
    ///
    /// # 返回
    /// - `Err(InvalidStateTransition)`: 从当前状态不允许转移到目标状态
    pub fn transition_status(
        &self,
        request_id: &str,
        to: RequestStatus,
        review_note: Option<&str>,
    ) -> RepositoryResult<()> {
        let current = self
            .find_by_id(request_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ScheduleRequest".to_string(),
                id: request_id.to_string(),
            })?;

        if !current.status.can_transition_to(to) {
            return Err(RepositoryError::InvalidStateTransition {
                from: current.status.to_string(),
                to: to.to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE schedule_request
             SET status = ?, review_note = COALESCE(?, review_note),
                 updated_at = datetime('now')
             WHERE request_id = ?",
            params![to.to_db_str(), review_note, request_id],
        )?;

        Ok(())
    }

    /// 映射数据库行到ScheduleRequest对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ScheduleRequest> {
        let type_str: String = row.get(2)?;
        let request_type = RequestType::from_str(&type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("非法申请类型: {}", type_str).into(),
            )
        })?;

        let status_str: String = row.get(10)?;
        let status = RequestStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                10,
                rusqlite::types::Type::Text,
                format!("非法申请状态: {}", status_str).into(),
            )
        })?;

        let requested_day = row
            .get::<_, Option<String>>(7)?
            .and_then(|s| DayOfWeek::from_str(&s));

        Ok(ScheduleRequest {
            request_id: row.get(0)?,
            instructor_id: row.get(1)?,
            request_type,
            course_id: row.get(3)?,
            schedule_id: row.get(4)?,
            room_id: row.get(5)?,
            requested_date: row.get::<_, Option<NaiveDate>>(6)?,
            requested_day,
            requested_start_minutes: row.get(8)?,
            requested_end_minutes: row.get(9)?,
            status,
            conflict_flag: row.get(11)?,
            conflicts: parse_json_col(12, &row.get::<_, String>(12)?)?,
            review_note: row.get(13)?,
            instructor_name: row.get(14)?,
            course_code: row.get(15)?,
            course_name: row.get(16)?,
            room_name: row.get(17)?,
            created_at: parse_ts(18, &row.get::<_, String>(18)?)?,
            updated_at: parse_ts(19, &row.get::<_, String>(19)?)?,
        })
    }
}
