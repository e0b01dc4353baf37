use chrono::Utc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::calendar::{self, NormalizeError, NormalizedCalendar};
use crate::db::{
    CalendarHeader, CalendarRepository, CalendarWithDetails, DbError, NewCalendarDetail,
    NewCalendarHeader,
};

/// Error types for calendar upload operations
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File and Client Name are required")]
    MissingInput,

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("Calendar for {client} in {year} already exists.")]
    Conflict { client: String, year: i32 },

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Normalization task failed: {0}")]
    Task(String),
}

/// A calendar upload as received from the transport layer
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub client_name: String,
    pub uploaded_by: String,
    pub overwrite: bool,
    pub file_bytes: Vec<u8>,
}

/// What a successful upload stored
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub header: CalendarHeader,
    pub records_stored: usize,
    pub rows_skipped: usize,
}

/// Service for the calendar upload flow and calendar lookups
#[derive(Clone)]
pub struct CalendarService {
    calendar_repo: CalendarRepository,
}

impl CalendarService {
    pub fn new(calendar_repo: CalendarRepository) -> Self {
        Self { calendar_repo }
    }

    /// Normalize an uploaded workbook and store it as the client's calendar for its year
    ///
    /// 1. Normalizes the workbook off the async runtime
    /// 2. Finds or creates the client
    /// 3. Rejects the upload if the client already has a calendar for the year, unless overwriting
    /// 4. Stores header + details, replacing the existing calendar when asked to
    #[instrument(skip(self, request), fields(client = %request.client_name, bytes = request.file_bytes.len(), overwrite = request.overwrite))]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, UploadError> {
        let start_time = Instant::now();
        let client_name = request.client_name.trim().to_string();
        if client_name.is_empty() || request.file_bytes.is_empty() {
            warn!("Rejecting upload with missing file or client name");
            return Err(UploadError::MissingInput);
        }

        let bytes = request.file_bytes;
        let calendar = tokio::task::spawn_blocking(move || calendar::normalize(&bytes))
            .await
            .map_err(|e| {
                error!("Normalization task panicked or was cancelled: {}", e);
                UploadError::Task(e.to_string())
            })?
            .inspect_err(|e| warn!("Rejected calendar for {}: {}", client_name, e))?;

        let year = calendar.inferred_year;
        let client = self.calendar_repo.find_or_create_client(&client_name).await?;

        if !request.overwrite {
            if let Some(existing) = self
                .calendar_repo
                .find_header_for_year(client.id, year)
                .await?
            {
                info!(
                    "Calendar for {} in {} already exists as {}",
                    client_name, year, existing.cycle_code
                );
                return Err(UploadError::Conflict {
                    client: client_name,
                    year,
                });
            }
        }

        let header = NewCalendarHeader {
            cycle_code: Self::cycle_code(&client_name, year),
            year,
            cycles: calendar.max_cycle,
            uploaded_by: request.uploaded_by.clone(),
            client_id: client.id,
        };
        let rows_skipped = calendar.skipped_rows.len();
        let details = Self::to_details(calendar, &request.uploaded_by);
        let records_stored = details.len();

        // save_calendar re-checks the year inside its transaction
        let header = self
            .calendar_repo
            .save_calendar(header, details, request.overwrite)
            .await
            .map_err(|e| match e {
                DbError::DuplicateCalendar { year, .. } => UploadError::Conflict {
                    client: client_name.clone(),
                    year,
                },
                other => UploadError::Database(other),
            })?;

        info!(
            "Stored calendar {} for {} ({} days, {} rows skipped, {:.1}ms)",
            header.cycle_code,
            client_name,
            records_stored,
            rows_skipped,
            start_time.elapsed().as_secs_f64() * 1000.0
        );

        Ok(UploadOutcome {
            header,
            records_stored,
            rows_skipped,
        })
    }

    /// All calendar headers, newest first
    pub async fn list_calendars(&self) -> Result<Vec<CalendarHeader>, DbError> {
        self.calendar_repo.list_headers().await
    }

    /// Single calendar with its days in date order
    pub async fn get_calendar(&self, header_id: i64) -> Result<CalendarWithDetails, DbError> {
        self.calendar_repo
            .find_with_details(header_id)
            .await?
            .ok_or(DbError::HeaderNotFound(header_id))
    }

    /// Unique code for an uploaded calendar: `<client>_<year>_<unix millis>`
    fn cycle_code(client_name: &str, year: i32) -> String {
        format!("{}_{}_{}", client_name, year, Utc::now().timestamp_millis())
    }

    fn to_details(calendar: NormalizedCalendar, modified_by: &str) -> Vec<NewCalendarDetail> {
        calendar
            .records
            .into_iter()
            .map(|r| NewCalendarDetail {
                mcp_date: r.date,
                cycle_number: r.cycle_number,
                day_type: r.day_type,
                zone: r.zone,
                plot_flag: r.plot_flag,
                version: r.version,
                modified_by: modified_by.to_string(),
            })
            .collect()
    }
}
