pub mod internal;

pub use internal::{
    BackendHealth, ChatReply, Conversation, ExportFormat, ExportPayload, Message, PaperReference,
    SearchMode, SearchType, Sender, GREETING,
};
