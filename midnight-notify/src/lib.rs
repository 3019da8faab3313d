//! Outbound email for booking results, delivered over async SMTP.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use midnight_domain::{BookingRequest, Notifier, UserProfile, UserRepository};

type NotifyError = Box<dyn std::error::Error + Send + Sync>;

/// SMTP relay settings for the email notifier. `credentials` is optional so
/// an unauthenticated local relay works in development.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub credentials: Option<(String, String)>,
    pub from_email: String,
    pub app_url: String,
}

/// Sends booking result emails. Looks the recipient up by the booking's
/// owner id at send time so address changes take effect immediately.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    app_url: String,
    users: Arc<dyn UserRepository>,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig, users: Arc<dyn UserRepository>) -> Result<Self, NotifyError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?;
        if let Some((username, password)) = &config.credentials {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from_email: config.from_email.clone(),
            app_url: config.app_url.clone(),
            users,
        })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn booking_result(
        &self,
        booking: &BookingRequest,
        success: bool,
    ) -> Result<(), NotifyError> {
        let Some(user) = self.users.find(booking.user_id).await? else {
            warn!(user_id = %booking.user_id, "notification recipient not found");
            return Ok(());
        };

        let subject = if success {
            "Booking Successful ✓"
        } else {
            "Booking Failed ✗"
        };

        let message = Message::builder()
            .from(self.from_email.parse()?)
            .to(user.email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(render_booking_result(booking, &user, success, &self.app_url))?;

        self.transport.send(message).await?;
        info!(booking_id = %booking.id, recipient = %user.email, "booking result email sent");
        Ok(())
    }
}

fn render_booking_result(
    booking: &BookingRequest,
    user: &UserProfile,
    success: bool,
    app_url: &str,
) -> String {
    let (banner_color, banner_icon, banner_text) = if success {
        ("#10b981", "✓", "Successfully Completed")
    } else {
        ("#ef4444", "✗", "Failed")
    };

    let mut rows = String::new();
    detail_row(
        &mut rows,
        "Route:",
        &format!("{} → {}", booking.origin, booking.destination),
    );
    detail_row(&mut rows, "Departure:", &booking.departure_date.to_string());
    if let Some(return_date) = booking.return_date {
        detail_row(&mut rows, "Return:", &return_date.to_string());
    }
    detail_row(&mut rows, "Passengers:", &booking.passengers.to_string());
    if let Some(reference) = &booking.booking_reference {
        detail_row(&mut rows, "Booking Reference:", reference);
    }
    detail_row(
        &mut rows,
        "Status:",
        booking.result_message.as_deref().unwrap_or(""),
    );

    format!(
        r#"<html>
  <body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
    <div style="background-color: {banner_color}; color: white; padding: 20px; text-align: center;">
      <h1 style="margin: 0;">Booking {banner_icon}</h1>
      <p style="margin: 5px 0 0 0; font-size: 18px;">{banner_text}</p>
    </div>
    <div style="padding: 20px;">
      <h2>Hi {email},</h2>
      <p>Your automated booking request has {verdict}.</p>
      <h3>Booking Details:</h3>
      <table style="width: 100%; border-collapse: collapse;">{rows}</table>
      <p style="margin-top: 20px;">
        <a href="{app_url}/dashboard" style="background-color: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; display: inline-block;">View Dashboard</a>
      </p>
      <p style="color: #6b7280; font-size: 14px; margin-top: 30px;">
        This is an automated message. Please do not reply to this email.
      </p>
    </div>
  </body>
</html>"#,
        email = user.email,
        verdict = if success {
            "completed successfully"
        } else {
            "failed"
        },
    )
}

fn detail_row(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(
        r#"<tr><td style="padding: 8px; border-bottom: 1px solid #e5e7eb;"><strong>{label}</strong></td><td style="padding: 8px; border-bottom: 1px solid #e5e7eb;">{value}</td></tr>"#
    ));
}
