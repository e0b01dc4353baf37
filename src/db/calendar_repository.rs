use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, instrument};

use crate::db::{
    CalendarDetail, CalendarDetailRow, CalendarHeader, CalendarWithDetails, Client, DbError,
    NewCalendarDetail, NewCalendarHeader,
};

#[derive(Clone)]
pub struct CalendarRepository {
    pool: SqlitePool,
}

impl CalendarRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a client by exact name, creating it on first use
    #[instrument(skip(self))]
    pub async fn find_or_create_client(&self, name: &str) -> Result<Client, DbError> {
        if let Some(client) = self.find_client_by_name(name).await? {
            return Ok(client);
        }

        sqlx::query("INSERT INTO clients (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let client = sqlx::query_as::<_, Client>("SELECT id, name FROM clients WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        info!("Created client {} ({})", client.name, client.id);
        Ok(client)
    }

    #[instrument(skip(self))]
    pub async fn find_client_by_name(&self, name: &str) -> Result<Option<Client>, DbError> {
        let client = sqlx::query_as::<_, Client>("SELECT id, name FROM clients WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    /// The calendar a client already has for a year, if any
    #[instrument(skip(self))]
    pub async fn find_header_for_year(
        &self,
        client_id: i64,
        year: i32,
    ) -> Result<Option<CalendarHeader>, DbError> {
        let header = sqlx::query_as::<_, CalendarHeader>(
            r#"
            SELECT h.header_id, h.cycle_code, h.year, h.cycles, h.uploaded_by, h.uploaded_date,
                   h.client_id, c.name AS client_name
            FROM calendar_headers h
            JOIN clients c ON c.id = h.client_id
            WHERE h.client_id = ? AND h.year = ?
            "#,
        )
        .bind(client_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        Ok(header)
    }

    /// Store a header with its details in one transaction
    ///
    /// A client keeps one calendar per year. An existing one is replaced when
    /// `overwrite` is set and rejected with [`DbError::DuplicateCalendar`] otherwise.
    #[instrument(skip(self, header, details), fields(client_id = header.client_id, year = header.year, count = details.len()))]
    pub async fn save_calendar(
        &self,
        header: NewCalendarHeader,
        details: Vec<NewCalendarDetail>,
        overwrite: bool,
    ) -> Result<CalendarHeader, DbError> {
        let duplicate = DbError::DuplicateCalendar {
            client_id: header.client_id,
            year: header.year,
        };

        debug!("Beginning transaction to store {} calendar days", details.len());
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT header_id FROM calendar_headers WHERE client_id = ? AND year = ?",
        )
        .bind(header.client_id)
        .bind(header.year)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing_id) = existing {
            if !overwrite {
                return Err(duplicate);
            }
            let removed = Self::delete_calendar(&mut tx, existing_id).await?;
            info!(
                "Replaced calendar {} ({} details) for client {} year {}",
                existing_id, removed, header.client_id, header.year
            );
        }

        let client_name: String = sqlx::query_scalar("SELECT name FROM clients WHERE id = ?")
            .bind(header.client_id)
            .fetch_one(&mut *tx)
            .await?;

        let uploaded_date = Utc::now();
        let header_id = sqlx::query(
            r#"
            INSERT INTO calendar_headers (cycle_code, year, cycles, uploaded_by, uploaded_date, client_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&header.cycle_code)
        .bind(header.year)
        .bind(header.cycles)
        .bind(&header.uploaded_by)
        .bind(uploaded_date)
        .bind(header.client_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => duplicate,
            other => DbError::SqlxError(other),
        })?
        .last_insert_rowid();

        for detail in &details {
            sqlx::query(
                r#"
                INSERT INTO calendar_details
                    (header_id, mcp_date, cycle_number, day_type, zone, plot_flag, version, modified_by)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(header_id)
            .bind(detail.mcp_date)
            .bind(detail.cycle_number)
            .bind(detail.day_type.code())
            .bind(detail.zone)
            .bind(detail.plot_flag)
            .bind(detail.version)
            .bind(&detail.modified_by)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Stored calendar header {}", header_id);

        Ok(CalendarHeader {
            header_id,
            cycle_code: header.cycle_code,
            year: header.year,
            cycles: header.cycles,
            uploaded_by: header.uploaded_by,
            uploaded_date,
            client_id: header.client_id,
            client_name,
        })
    }

    /// Delete a header and its details, returning how many details went with it
    async fn delete_calendar(
        tx: &mut Transaction<'_, Sqlite>,
        header_id: i64,
    ) -> Result<u64, DbError> {
        let removed = sqlx::query("DELETE FROM calendar_details WHERE header_id = ?")
            .bind(header_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM calendar_headers WHERE header_id = ?")
            .bind(header_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(DbError::HeaderNotFound(header_id));
        }
        Ok(removed)
    }

    /// All headers, newest upload first
    #[instrument(skip(self))]
    pub async fn list_headers(&self) -> Result<Vec<CalendarHeader>, DbError> {
        let headers = sqlx::query_as::<_, CalendarHeader>(
            r#"
            SELECT h.header_id, h.cycle_code, h.year, h.cycles, h.uploaded_by, h.uploaded_date,
                   h.client_id, c.name AS client_name
            FROM calendar_headers h
            JOIN clients c ON c.id = h.client_id
            ORDER BY h.uploaded_date DESC, h.header_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} calendar headers", headers.len());
        Ok(headers)
    }

    /// A header with its details ordered by date
    #[instrument(skip(self))]
    pub async fn find_with_details(
        &self,
        header_id: i64,
    ) -> Result<Option<CalendarWithDetails>, DbError> {
        let header = sqlx::query_as::<_, CalendarHeader>(
            r#"
            SELECT h.header_id, h.cycle_code, h.year, h.cycles, h.uploaded_by, h.uploaded_date,
                   h.client_id, c.name AS client_name
            FROM calendar_headers h
            JOIN clients c ON c.id = h.client_id
            WHERE h.header_id = ?
            "#,
        )
        .bind(header_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, CalendarDetailRow>(
            r#"
            SELECT detail_id, header_id, mcp_date, cycle_number, day_type, zone, plot_flag,
                   version, modified_by
            FROM calendar_details
            WHERE header_id = ?
            ORDER BY mcp_date ASC, detail_id ASC
            "#,
        )
        .bind(header_id)
        .fetch_all(&self.pool)
        .await?;

        let details = rows
            .into_iter()
            .map(CalendarDetail::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(CalendarWithDetails { header, details }))
    }
}
