//! Canonical Responses schema exposed to callers, independent of any
//! upstream provider's wire format

mod item;
mod params;
mod request;
mod response;
mod stream;

pub use item::{InputItem, OutputItem};
pub use params::OptionalParams;
pub use request::{ResponseInput, ResponsesRequest};
pub use response::{ResponseError, ResponseStatus, ResponseUsage, ResponsesResult};
pub use stream::ResponseStreamEvent;
