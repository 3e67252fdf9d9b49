pub mod generate_content;
pub mod nostream2stream;
pub mod output;
pub mod stream2nostream;

pub use output::{AssembledResponse, ProviderOutput, ProviderResponse, StreamEvent};
