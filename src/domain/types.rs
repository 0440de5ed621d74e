// ==========================================
// 教务排课系统 - 领域类型定义
// ==========================================
// 职责: 课程/教室/课表/调课申请的枚举类型与时间工具
// 约束: 序列化格式 SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 课程类型 (Course Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseKind {
    Lecture, // 理论课
    Lab,     // 实验课
    Seminar, // 研讨课
}

impl fmt::Display for CourseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CourseKind {
    /// 从字符串解析课程类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LECTURE" => Some(CourseKind::Lecture),
            "LAB" => Some(CourseKind::Lab),
            "SEMINAR" => Some(CourseKind::Seminar),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CourseKind::Lecture => "LECTURE",
            CourseKind::Lab => "LAB",
            CourseKind::Seminar => "SEMINAR",
        }
    }
}

// ==========================================
// 教室类型 (Room Kind)
// ==========================================
// 排课时按课程类型匹配: 实验课优先实验室/机房
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomKind {
    Classroom,   // 普通教室
    Laboratory,  // 实验室
    ComputerLab, // 机房
    Auditorium,  // 阶梯教室
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RoomKind {
    /// 从字符串解析教室类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CLASSROOM" => Some(RoomKind::Classroom),
            "LABORATORY" => Some(RoomKind::Laboratory),
            "COMPUTER_LAB" => Some(RoomKind::ComputerLab),
            "AUDITORIUM" => Some(RoomKind::Auditorium),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RoomKind::Classroom => "CLASSROOM",
            RoomKind::Laboratory => "LABORATORY",
            RoomKind::ComputerLab => "COMPUTER_LAB",
            RoomKind::Auditorium => "AUDITORIUM",
        }
    }
}

// ==========================================
// 课表状态 (Schedule Status)
// ==========================================
// 生命周期: DRAFT -> PUBLISHED; 冲突强制保存为 CONFLICT; 取消为 CANCELED
// 冲突检测快照只统计非 CANCELED 行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Draft,     // 草稿
    Published, // 已发布
    Conflict,  // 带冲突强制保存
    Canceled,  // 已取消
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ScheduleStatus {
    /// 从字符串解析课表状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(ScheduleStatus::Draft),
            "PUBLISHED" => Some(ScheduleStatus::Published),
            "CONFLICT" => Some(ScheduleStatus::Conflict),
            "CANCELED" => Some(ScheduleStatus::Canceled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Draft => "DRAFT",
            ScheduleStatus::Published => "PUBLISHED",
            ScheduleStatus::Conflict => "CONFLICT",
            ScheduleStatus::Canceled => "CANCELED",
        }
    }
}

// ==========================================
// 调课申请类型 (Request Type)
// ==========================================
// SCHEDULE_CONFLICT 仅用于申请分类/路由, 不参与冲突检测
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    RoomChange,       // 换教室
    TimeChange,       // 换时间
    ScheduleConflict, // 课表冲突申诉
    BorrowSchedule,   // 借课(代课)
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RequestType {
    /// 从字符串解析申请类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ROOM_CHANGE" => Some(RequestType::RoomChange),
            "TIME_CHANGE" => Some(RequestType::TimeChange),
            "SCHEDULE_CONFLICT" => Some(RequestType::ScheduleConflict),
            "BORROW_SCHEDULE" => Some(RequestType::BorrowSchedule),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RequestType::RoomChange => "ROOM_CHANGE",
            RequestType::TimeChange => "TIME_CHANGE",
            RequestType::ScheduleConflict => "SCHEDULE_CONFLICT",
            RequestType::BorrowSchedule => "BORROW_SCHEDULE",
        }
    }
}

// ==========================================
// 调课申请状态 (Request Status)
// ==========================================
// 状态机: PENDING -> UNDER_REVIEW -> APPROVED | REJECTED
//         PENDING -> APPROVED | REJECTED (直接审批)
// APPROVED/REJECTED 为终态, 不允许再转移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,     // 待处理
    UnderReview, // 审核中
    Approved,    // 已批准
    Rejected,    // 已驳回
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RequestStatus {
    /// 从字符串解析申请状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(RequestStatus::Pending),
            "UNDER_REVIEW" => Some(RequestStatus::UnderReview),
            "APPROVED" => Some(RequestStatus::Approved),
            "REJECTED" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::UnderReview => "UNDER_REVIEW",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }

    /// 校验状态转移是否合法
    pub fn can_transition_to(&self, to: RequestStatus) -> bool {
        match self {
            RequestStatus::Pending => matches!(
                to,
                RequestStatus::UnderReview | RequestStatus::Approved | RequestStatus::Rejected
            ),
            RequestStatus::UnderReview => {
                matches!(to, RequestStatus::Approved | RequestStatus::Rejected)
            }
            // 终态不可转移
            RequestStatus::Approved | RequestStatus::Rejected => false,
        }
    }
}

// ==========================================
// 星期 (Day Of Week)
// ==========================================
// 排课工作日为周一至周六, 周日不排课
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl DayOfWeek {
    /// 从字符串解析星期
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MONDAY" => Some(DayOfWeek::Monday),
            "TUESDAY" => Some(DayOfWeek::Tuesday),
            "WEDNESDAY" => Some(DayOfWeek::Wednesday),
            "THURSDAY" => Some(DayOfWeek::Thursday),
            "FRIDAY" => Some(DayOfWeek::Friday),
            "SATURDAY" => Some(DayOfWeek::Saturday),
            "SUNDAY" => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
            DayOfWeek::Sunday => "SUNDAY",
        }
    }

    /// 从日历日期取星期
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
            chrono::Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

// ==========================================
// 时间工具 (分钟精度, 24小时制)
// ==========================================
// 时间统一用"自零点起的分钟数"表示, 区间为半开区间 [start, end)

/// 格式化分钟数为 "HH:MM"
pub fn format_minutes(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// 解析 "HH:MM" 为分钟数
///
/// # 返回
/// - `Some(minutes)`: 合法的 24 小时制时间 (最大 23:59)
/// - `None`: 格式或取值非法
pub fn parse_hhmm(s: &str) -> Option<u16> {
    let (h, m) = s.split_once(':')?;
    let h: u16 = h.parse().ok()?;
    let m: u16 = m.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}
