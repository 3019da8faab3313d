use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midnight_api::{app, state::AuthConfig, AppState};
use midnight_automation::{ScriptedSiteDriver, SiteProfile, WebDriverBrowser};
use midnight_domain::{CredentialVault, Notifier, NoopNotifier};
use midnight_notify::{EmailNotifier, SmtpConfig};
use midnight_pipeline::{BookingExecutor, BookingScheduler, SchedulerConfig};
use midnight_store::{
    app_config::Config, AeadVault, DbClient, PgBookingRepository, PgCredentialRepository,
    PgUserRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "midnight_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Midnight API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let bookings = Arc::new(PgBookingRepository::new(db.pool.clone()));
    let credentials = Arc::new(PgCredentialRepository::new(db.pool.clone()));
    let users = Arc::new(PgUserRepository::new(db.pool.clone()));
    let vault: Arc<dyn CredentialVault> =
        Arc::new(AeadVault::from_hex_key(&config.vault.key_hex).expect("Invalid vault key"));

    // Site automation: scripted flow over a WebDriver-backed browser
    let browser = Arc::new(WebDriverBrowser::new(config.automation.webdriver_url.clone()));
    let profile = SiteProfile::new(config.automation.site_url.clone()).with_results_timeout(
        Duration::from_secs(config.automation.results_timeout_seconds),
    );
    let driver = Arc::new(ScriptedSiteDriver::new(browser, profile));

    let notifier: Arc<dyn Notifier> = match &config.smtp.host {
        Some(host) => {
            let smtp = SmtpConfig {
                host: host.clone(),
                credentials: config
                    .smtp
                    .username
                    .clone()
                    .zip(config.smtp.password.clone()),
                from_email: config.smtp.from_email.clone(),
                app_url: config.smtp.app_url.clone(),
            };
            Arc::new(EmailNotifier::new(&smtp, users.clone()).expect("Failed to build SMTP notifier"))
        }
        None => {
            tracing::info!("SMTP not configured, booking notifications disabled");
            Arc::new(NoopNotifier)
        }
    };

    let executor = Arc::new(BookingExecutor::new(
        bookings.clone(),
        credentials.clone(),
        vault.clone(),
        driver,
        notifier,
    ));

    let scheduler = Arc::new(BookingScheduler::new(
        bookings.clone(),
        executor,
        SchedulerConfig {
            tick_interval: Duration::from_secs(config.scheduler.tick_seconds),
            lookback: chrono::Duration::minutes(config.scheduler.lookback_minutes),
            lookahead: chrono::Duration::minutes(config.scheduler.lookahead_minutes),
            max_concurrent: config.scheduler.max_concurrent,
        },
    ));
    let scheduler_handle = scheduler.start();

    let app_state = AppState {
        bookings,
        credentials,
        users,
        vault,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .unwrap();

    scheduler_handle.stop().await;
}
