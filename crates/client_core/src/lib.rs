//! Client logic for the wedding RSVP app: view state, countdown, guest
//! statistics, exports, and the gateway to the hosted registry.

pub mod config;
pub mod countdown;
pub mod csv_export;
pub mod error;
pub mod gateway;
pub mod invitation;
pub mod rest;
pub mod session_store;
pub mod stats;
pub mod view;

pub use config::{load_settings, ClientConfig, ConfigError, EventDetails, Settings};
pub use countdown::{time_remaining, Countdown, CountdownDuration, CountdownTicker};
pub use csv_export::{guest_list_csv, CsvStyle, GUEST_LIST_FILE_NAME, GUEST_LIST_HEADERS};
pub use error::GatewayError;
pub use gateway::{
    execute, GatewayOutcome, GatewayRequest, RegistryGateway, RequestKind, SessionChange,
};
pub use invitation::{invitation_text, INVITATION_FILE_NAME};
pub use rest::RestGateway;
pub use session_store::SessionStore;
pub use stats::{guest_statistics, GuestStatistics};
pub use view::{AdminScreen, FormDraft, Notice, NoticeSeverity, ViewMode, ViewModel};
