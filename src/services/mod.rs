pub mod attempt_service;
pub mod auth_service;
pub mod dispatch_service;
pub mod mailing_service;
pub mod message_service;
pub mod recipient_service;
pub mod stats_service;
pub mod status;
pub mod user_service;
