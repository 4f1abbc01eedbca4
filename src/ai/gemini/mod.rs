pub mod chat;
pub mod client;
pub mod edit;
pub mod types;

pub use chat::GeminiChatClient;
pub use edit::GeminiImageEditClient;

/// Adds a test-only base URL override that forwards to the inner
/// [`client::GeminiHttpClient`].
#[cfg(test)]
macro_rules! impl_with_gemini_base_url {
    ($client:ident) => {
        impl $client {
            fn with_base_url(mut self, base_url: String) -> Self {
                self.http = self.http.with_base_url(base_url);
                self
            }
        }
    };
}

#[cfg(test)]
pub(crate) use impl_with_gemini_base_url;
