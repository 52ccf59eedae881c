//! Shared test harness: an in-process mock provider speaking the
//! Responses wire format

pub mod mock_provider;
