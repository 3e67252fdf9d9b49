pub mod catalog;
pub mod chat;
pub mod gemini;
pub mod openai;
pub mod sse;
