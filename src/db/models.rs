use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::calendar::DayType;
use crate::db::DbError;

// Database entity models
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarHeader {
    pub header_id: i64,
    pub cycle_code: String,
    pub year: i32,
    pub cycles: u32,
    pub uploaded_by: String,
    pub uploaded_date: DateTime<Utc>,
    pub client_id: i64,
    pub client_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDetail {
    pub detail_id: i64,
    pub header_id: i64,
    pub mcp_date: NaiveDate,
    pub cycle_number: u32,
    #[serde(rename = "type")]
    pub day_type: DayType,
    pub zone: u32,
    pub plot_flag: bool,
    pub version: i32,
    pub modified_by: String,
}

/// `calendar_details` row as stored, with the day type still in its text form
#[derive(Debug, Clone, FromRow)]
pub(crate) struct CalendarDetailRow {
    pub detail_id: i64,
    pub header_id: i64,
    pub mcp_date: NaiveDate,
    pub cycle_number: u32,
    pub day_type: String,
    pub zone: u32,
    pub plot_flag: bool,
    pub version: i32,
    pub modified_by: String,
}

impl TryFrom<CalendarDetailRow> for CalendarDetail {
    type Error = DbError;

    fn try_from(row: CalendarDetailRow) -> Result<Self, Self::Error> {
        let day_type =
            DayType::from_code(&row.day_type).ok_or(DbError::InvalidDayType(row.day_type))?;
        Ok(Self {
            detail_id: row.detail_id,
            header_id: row.header_id,
            mcp_date: row.mcp_date,
            cycle_number: row.cycle_number,
            day_type,
            zone: row.zone,
            plot_flag: row.plot_flag,
            version: row.version,
            modified_by: row.modified_by,
        })
    }
}

// Insert payloads (ids are assigned by the repository)
#[derive(Debug, Clone)]
pub struct NewCalendarHeader {
    pub cycle_code: String,
    pub year: i32,
    pub cycles: u32,
    pub uploaded_by: String,
    pub client_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewCalendarDetail {
    pub mcp_date: NaiveDate,
    pub cycle_number: u32,
    pub day_type: DayType,
    pub zone: u32,
    pub plot_flag: bool,
    pub version: i32,
    pub modified_by: String,
}

// API response DTOs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarWithDetails {
    #[serde(flatten)]
    pub header: CalendarHeader,
    pub details: Vec<CalendarDetail>,
}
