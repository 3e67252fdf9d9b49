pub mod chat2gemini;
pub mod chat2openai;
pub mod completion2chat;
