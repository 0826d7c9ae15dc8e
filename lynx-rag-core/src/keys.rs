//! Reserved metadata keys owned by the runtime.
//!
//! These strings are part of the public contract: external callers read and
//! write them, so their values never change.

/// Response metadata key holding the refined document set (`ExtraValue::Documents`).
pub const DOCUMENT_CONTEXT: &str = "lynx:ai:rag:document_context";

/// Query extras key holding the conversation history (`ExtraValue::Messages`).
pub const CHAT_HISTORY: &str = "lynx:ai:rag:chat_history";

/// Query extras key holding a retrieval filter, either an AST or a string to parse.
pub const FILTER_EXPRESSION: &str = "lynx:ai:rag:retriever:filter_expr";
