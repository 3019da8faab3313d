use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking request status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Canceled,
}

impl BookingStatus {
    /// Database representation (lowercase, stable across releases)
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Processing => "processing",
            BookingStatus::Success => "success",
            BookingStatus::Failed => "failed",
            BookingStatus::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "processing" => Some(BookingStatus::Processing),
            "success" => Some(BookingStatus::Success),
            "failed" => Some(BookingStatus::Failed),
            "canceled" => Some(BookingStatus::Canceled),
            _ => None,
        }
    }

    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Success | BookingStatus::Failed | BookingStatus::Canceled
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's intent to book one trip at midnight of the departure date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: BookingStatus,

    // Itinerary
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub passengers: i32,

    // Preferences, opaque to everything but the site driver
    pub primary_option: serde_json::Value,
    pub backup_option: serde_json::Value,
    pub max_price: Option<f64>,

    // Execution record
    pub scheduled_time: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub result_message: Option<String>,
    pub booking_reference: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating or editing a booking request
#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[serde(default = "default_passengers")]
    pub passengers: i32,
    #[serde(default)]
    pub primary_option: serde_json::Value,
    #[serde(default)]
    pub backup_option: serde_json::Value,
    pub max_price: Option<f64>,
}

fn default_passengers() -> i32 {
    1
}

impl NewBooking {
    fn validate(&self) -> Result<(), BookingError> {
        if self.origin.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(BookingError::MissingItinerary);
        }
        if self.passengers < 1 {
            return Err(BookingError::InvalidPassengerCount(self.passengers));
        }
        if let Some(p) = self.max_price {
            if p <= 0.0 {
                return Err(BookingError::InvalidMaxPrice(p));
            }
        }
        Ok(())
    }
}

impl BookingRequest {
    /// Create a new PENDING request. The execution instant is computed once,
    /// here, as local midnight of the departure date in the owner's timezone.
    pub fn new(user_id: Uuid, input: NewBooking, timezone: &str) -> Result<Self, BookingError> {
        input.validate()?;
        let scheduled_time = midnight_in_timezone(input.departure_date, timezone)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            status: BookingStatus::Pending,
            origin: input.origin,
            destination: input.destination,
            departure_date: input.departure_date,
            return_date: input.return_date,
            passengers: input.passengers,
            primary_option: input.primary_option,
            backup_option: input.backup_option,
            max_price: input.max_price,
            scheduled_time,
            executed_at: None,
            result_message: None,
            booking_reference: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Owner edits are permitted only while the request is still PENDING.
    /// The scheduled time is recomputed if the departure date changes, using
    /// the same timezone rule as creation.
    pub fn apply_edit(&mut self, input: NewBooking, timezone: &str) -> Result<(), BookingError> {
        if self.status != BookingStatus::Pending {
            return Err(BookingError::EditNotAllowed(self.status));
        }
        input.validate()?;
        if input.departure_date != self.departure_date {
            self.scheduled_time = midnight_in_timezone(input.departure_date, timezone)?;
        }
        self.origin = input.origin;
        self.destination = input.destination;
        self.departure_date = input.departure_date;
        self.return_date = input.return_date;
        self.passengers = input.passengers;
        self.primary_option = input.primary_option;
        self.backup_option = input.backup_option;
        self.max_price = input.max_price;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Cancellation guard. Only SUCCESS and PROCESSING block a cancel; a
    /// FAILED request may still be canceled by its owner.
    pub fn can_cancel(&self) -> bool {
        !matches!(
            self.status,
            BookingStatus::Success | BookingStatus::Processing
        )
    }

    pub fn can_edit(&self) -> bool {
        self.status == BookingStatus::Pending
    }
}

/// Local midnight of `date` in the given IANA timezone, normalized to UTC
pub fn midnight_in_timezone(date: NaiveDate, timezone: &str) -> Result<DateTime<Utc>, BookingError> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| BookingError::UnknownTimezone(timezone.to_string()))?;
    let local = date.and_time(NaiveTime::MIN);

    let localized = match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        // Fall-back day: take the earlier of the two midnights
        LocalResult::Ambiguous(earliest, _) => earliest,
        // DST gap swallowed midnight entirely on this date in this zone
        LocalResult::None => return Err(BookingError::UnrepresentableMidnight(date)),
    };

    Ok(localized.with_timezone(&Utc))
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Origin and destination are required")]
    MissingItinerary,

    #[error("Passenger count must be at least 1, got {0}")]
    InvalidPassengerCount(i32),

    #[error("Max price must be positive, got {0}")]
    InvalidMaxPrice(f64),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Midnight does not exist on {0} in this timezone")]
    UnrepresentableMidnight(NaiveDate),

    #[error("Can only update pending bookings (status is {0})")]
    EditNotAllowed(BookingStatus),

    #[error("Cannot cancel completed or processing bookings (status is {0})")]
    CancelNotAllowed(BookingStatus),
}
