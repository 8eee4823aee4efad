//! In-process mock servers for integration tests.

pub mod websocket_mock;

pub use websocket_mock::MockSynthesisServer;
