pub mod scripted;
pub mod session;
pub mod webdriver;

pub use scripted::{ScriptedSiteDriver, SiteProfile};
pub use session::{Browser, BrowserSession, SessionError};
pub use webdriver::WebDriverBrowser;
