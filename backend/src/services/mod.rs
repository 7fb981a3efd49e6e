pub mod analyzer;
pub mod collector;
pub mod export;
pub mod session;
pub mod youtube_client;

#[cfg(test)]
pub mod stub_server;
