pub mod chat_client;
pub mod chat_view;
pub mod error;
pub mod io_struct;
pub mod relay_state;
pub mod server;
pub mod terminal;
pub mod ui;

pub use chat_client::{ChatClient, HttpChatClient, RelayOutcome, TransportError};
pub use chat_view::{ChatRole, ChatView, HistoryFraming, KeyAction, Turn};
pub use error::{RelayError, RelayResult};
pub use io_struct::{ChatReply, ChatRequest, HistoryItem, UpstreamReply};
pub use relay_state::{ApiKey, RelayConfig, RelayState};
