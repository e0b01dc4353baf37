#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Calendar already exists for client {client_id} in {year}")]
    DuplicateCalendar { client_id: i64, year: i32 },

    #[error("Calendar {0} not found")]
    HeaderNotFound(i64),

    #[error("Stored day type '{0}' is not R, W or H")]
    InvalidDayType(String),
}
