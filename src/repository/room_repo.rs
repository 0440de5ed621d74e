// ==========================================
// 教务排课系统 - 教室仓储
// ==========================================

use crate::domain::room::Room;
use crate::domain::types::RoomKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_json_col;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const COLUMNS: &str = "room_id, name, kind, capacity, building, floor, equipment, available";

// ==========================================
// RoomRepository - 教室仓储
// ==========================================
pub struct RoomRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RoomRepository {
    /// 创建新的RoomRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建教室
    pub fn create(&self, room: &Room) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO room (
                room_id, name, kind, capacity, building, floor, equipment, available
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &room.room_id,
                &room.name,
                room.kind.to_db_str(),
                room.capacity,
                &room.building,
                room.floor,
                serde_json::to_string(&room.equipment)?,
                room.available,
            ],
        )?;

        Ok(room.room_id.clone())
    }

    /// 按room_id查询教室
    pub fn find_by_id(&self, room_id: &str) -> RepositoryResult<Option<Room>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("SELECT {} FROM room WHERE room_id = ?", COLUMNS),
            params![room_id],
            Self::map_row,
        ) {
            Ok(room) => Ok(Some(room)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部可用教室, 按容量升序 (自动排课按"最小够用"优先选择)
    pub fn list_available(&self) -> RepositoryResult<Vec<Room>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM room WHERE available = 1 ORDER BY capacity, name",
            COLUMNS
        ))?;

        let rooms = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<Room>, _>>()?;

        Ok(rooms)
    }

    /// 更新教室
    pub fn update(&self, room: &Room) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            r#"UPDATE room
               SET name = ?, kind = ?, capacity = ?, building = ?, floor = ?,
                   equipment = ?, available = ?
               WHERE room_id = ?"#,
            params![
                &room.name,
                room.kind.to_db_str(),
                room.capacity,
                &room.building,
                room.floor,
                serde_json::to_string(&room.equipment)?,
                room.available,
                &room.room_id,
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Room".to_string(),
                id: room.room_id.clone(),
            });
        }

        Ok(())
    }

    /// 映射数据库行到Room对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Room> {
        let kind_str: String = row.get(2)?;
        let kind = RoomKind::from_str(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("非法教室类型: {}", kind_str).into(),
            )
        })?;

        Ok(Room {
            room_id: row.get(0)?,
            name: row.get(1)?,
            kind,
            capacity: row.get(3)?,
            building: row.get(4)?,
            floor: row.get(5)?,
            equipment: parse_json_col(6, &row.get::<_, String>(6)?)?,
            available: row.get(7)?,
        })
    }
}
