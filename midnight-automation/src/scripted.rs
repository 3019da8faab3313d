use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use midnight_domain::{BookingRequest, Outcome, SiteCredentials, SiteDriver};

use crate::session::{Browser, BrowserSession, SessionError};

/// CSS selectors for the supported travel site. Placeholder markup contract;
/// a second site gets its own profile and selector set.
mod selectors {
    pub const USERNAME: &str = r#"input[name="username"]"#;
    pub const PASSWORD: &str = r#"input[name="password"]"#;
    pub const SUBMIT: &str = r#"button[type="submit"]"#;
    pub const ORIGIN: &str = r#"input[name="origin"]"#;
    pub const DESTINATION: &str = r#"input[name="destination"]"#;
    pub const DEPARTURE_DATE: &str = r#"input[name="departure_date"]"#;
    pub const RETURN_DATE: &str = r#"input[name="return_date"]"#;
    pub const PASSENGERS: &str = r#"input[name="passengers"]"#;
    pub const RESULTS: &str = ".booking-results";
    pub const CHEAPEST_OPTION: &str = ".booking-option:first-child";
    pub const CHEAPEST_PRICE: &str = ".booking-option:first-child .price";
    pub const BOOK_BUTTON: &str = ".booking-option:first-child .book-button";
    pub const CONFIRM: &str = "button.confirm-booking";
    pub const REFERENCE: &str = ".booking-reference";
}

/// Where the site lives and how long to wait for its search results
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub base_url: String,
    pub results_timeout: Duration,
}

impl SiteProfile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            results_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_results_timeout(mut self, timeout: Duration) -> Self {
        self.results_timeout = timeout;
        self
    }
}

/// Drives the scripted login -> search -> select-cheapest -> confirm sequence
/// for one booking request. Opens a fresh session per run and releases it on
/// every exit path; faults are converted to failure outcomes, never raised.
pub struct ScriptedSiteDriver {
    browser: Arc<dyn Browser>,
    profile: SiteProfile,
}

impl ScriptedSiteDriver {
    pub fn new(browser: Arc<dyn Browser>, profile: SiteProfile) -> Self {
        Self { browser, profile }
    }

    async fn script(
        &self,
        page: &mut dyn BrowserSession,
        credentials: &SiteCredentials,
        booking: &BookingRequest,
    ) -> Result<Outcome, SessionError> {
        // Login
        page.goto(&self.profile.base_url).await?;
        page.fill(selectors::USERNAME, &credentials.username).await?;
        page.fill(selectors::PASSWORD, &credentials.password).await?;
        page.click(selectors::SUBMIT).await?;

        let url = page.current_url().await?;
        if !url.contains("dashboard") {
            return Ok(Outcome::failure(
                "Login failed - invalid credentials or site structure changed",
            ));
        }

        // Search
        page.goto(&format!("{}/book", self.profile.base_url)).await?;
        page.fill(selectors::ORIGIN, &booking.origin).await?;
        page.fill(selectors::DESTINATION, &booking.destination).await?;
        page.fill(selectors::DEPARTURE_DATE, &booking.departure_date.to_string())
            .await?;
        if let Some(return_date) = booking.return_date {
            page.fill(selectors::RETURN_DATE, &return_date.to_string())
                .await?;
        }
        page.fill(selectors::PASSENGERS, &booking.passengers.to_string())
            .await?;
        page.click(selectors::SUBMIT).await?;

        // A timeout is a failure outcome, not a fault that aborts the run
        if !page
            .wait_for(selectors::RESULTS, self.profile.results_timeout)
            .await?
        {
            return Ok(Outcome::failure(format!(
                "Browser automation error: timed out after {}s waiting for search results",
                self.profile.results_timeout.as_secs()
            )));
        }

        // The site sorts ascending; the first option is the cheapest
        if !page.exists(selectors::CHEAPEST_OPTION).await? {
            return Ok(Outcome::failure("No booking options available"));
        }

        // Price ceiling, best effort: an unparseable price string does not
        // block the booking
        if let Some(max_price) = booking.max_price {
            if let Some(price_text) = page.text(selectors::CHEAPEST_PRICE).await? {
                let cleaned = price_text.replace('$', "").replace(',', "");
                if let Ok(price) = cleaned.trim().parse::<f64>() {
                    if price > max_price {
                        return Ok(Outcome::failure(format!(
                            "Lowest price ${} exceeds max price ${}",
                            price, max_price
                        )));
                    }
                } else {
                    debug!(price = %price_text, "unparseable price text, skipping ceiling check");
                }
            }
        }

        // Book and confirm
        page.click(selectors::BOOK_BUTTON).await?;
        page.click(selectors::CONFIRM).await?;

        // Best effort; a missing reference is not a failure
        let booking_reference = page.text(selectors::REFERENCE).await.unwrap_or(None);

        Ok(Outcome::success(
            "Booking completed successfully",
            booking_reference,
        ))
    }
}

#[async_trait]
impl SiteDriver for ScriptedSiteDriver {
    async fn run(&self, credentials: &SiteCredentials, booking: &BookingRequest) -> Outcome {
        let mut page = match self.browser.open().await {
            Ok(page) => page,
            Err(e) => return Outcome::failure(format!("Browser automation error: {}", e)),
        };

        let result = self.script(page.as_mut(), credentials, booking).await;

        if let Err(e) = page.close().await {
            warn!(error = %e, booking_id = %booking.id, "failed to release browser session");
        }

        match result {
            Ok(outcome) => outcome,
            Err(e) => Outcome::failure(format!("Browser automation error: {}", e)),
        }
    }
}
