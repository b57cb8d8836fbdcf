pub mod mailer;
pub mod template;

pub use mailer::{DisabledMailer, Mailer, SmtpMailer};
