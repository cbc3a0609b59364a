pub mod amqp;
pub mod health;
pub mod mailer;
pub mod users;
