//! User notifier backends.

pub mod memory;
pub mod telegram;

pub use memory::{InMemoryNotifier, InMemoryOperatorChannel, SentMessage};
pub use telegram::{parse_send_response, TelegramNotifier, TelegramServiceChat, TELEGRAM_API};
