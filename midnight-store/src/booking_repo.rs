use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use midnight_domain::{BookingRepository, BookingRequest, BookingStatus};

use crate::StoreError;

type RepoError = Box<dyn std::error::Error + Send + Sync>;

const BOOKING_COLUMNS: &str = "id, user_id, status, origin, destination, departure_date, \
     return_date, passengers, primary_option, backup_option, max_price, scheduled_time, \
     executed_at, result_message, booking_reference, created_at, updated_at";

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    status: String,
    origin: String,
    destination: String,
    departure_date: NaiveDate,
    return_date: Option<NaiveDate>,
    passengers: i32,
    primary_option: serde_json::Value,
    backup_option: serde_json::Value,
    max_price: Option<f64>,
    scheduled_time: DateTime<Utc>,
    executed_at: Option<DateTime<Utc>>,
    result_message: Option<String>,
    booking_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_domain(self) -> Result<BookingRequest, StoreError> {
        let status = BookingStatus::parse(&self.status)
            .ok_or_else(|| StoreError::InvalidStatus(self.status.clone()))?;
        Ok(BookingRequest {
            id: self.id,
            user_id: self.user_id,
            status,
            origin: self.origin,
            destination: self.destination,
            departure_date: self.departure_date,
            return_date: self.return_date,
            passengers: self.passengers,
            primary_option: self.primary_option,
            backup_option: self.backup_option,
            max_price: self.max_price,
            scheduled_time: self.scheduled_time,
            executed_at: self.executed_at,
            result_message: self.result_message,
            booking_reference: self.booking_reference,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create(&self, booking: &BookingRequest) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO booking_requests
                (id, user_id, status, origin, destination, departure_date, return_date,
                 passengers, primary_option, backup_option, max_price, scheduled_time,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.status.as_str())
        .bind(&booking.origin)
        .bind(&booking.destination)
        .bind(booking.departure_date)
        .bind(booking.return_date)
        .bind(booking.passengers)
        .bind(&booking.primary_option)
        .bind(&booking.backup_option)
        .bind(booking.max_price)
        .bind(booking.scheduled_time)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<BookingRequest>, RepoError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BookingRow::into_domain).transpose().map_err(Into::into)
    }

    async fn get_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BookingRequest>, RepoError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking_requests WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BookingRow::into_domain).transpose().map_err(Into::into)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<BookingRequest>, RepoError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking_requests \
             WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.into_domain().map_err(Into::into))
            .collect()
    }

    async fn update_details(&self, booking: &BookingRequest) -> Result<(), RepoError> {
        // Status guard repeated at the SQL level: edits only land on a row
        // that is still pending
        sqlx::query(
            r#"
            UPDATE booking_requests
            SET origin = $3, destination = $4, departure_date = $5, return_date = $6,
                passengers = $7, primary_option = $8, backup_option = $9, max_price = $10,
                scheduled_time = $11, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'pending'
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(&booking.origin)
        .bind(&booking.destination)
        .bind(booking.departure_date)
        .bind(booking.return_date)
        .bind(booking.passengers)
        .bind(&booking.primary_option)
        .bind(&booking.backup_option)
        .bind(booking.max_price)
        .bind(booking.scheduled_time)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_due(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BookingRequest>, RepoError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking_requests \
             WHERE status = 'pending' AND scheduled_time > $1 AND scheduled_time <= $2"
        ))
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.into_domain().map_err(Into::into))
            .collect()
    }

    async fn claim_for_processing(&self, id: Uuid, message: &str) -> Result<bool, RepoError> {
        // Single conditional update: the status check and the write are one
        // atomic unit, so concurrent scanners race safely on the row count
        let result = sqlx::query(
            r#"
            UPDATE booking_requests
            SET status = 'processing', result_message = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        status: BookingStatus,
        message: &str,
        booking_reference: Option<&str>,
        executed_at: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE booking_requests
            SET status = $2, result_message = $3, booking_reference = $4,
                executed_at = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(message)
        .bind(booking_reference)
        .bind(executed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn cancel(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        // Cancellation is blocked only from SUCCESS and PROCESSING; a failed
        // request may still be canceled by its owner
        let result = sqlx::query(
            r#"
            UPDATE booking_requests
            SET status = 'canceled', updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status NOT IN ('success', 'processing')
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
