pub mod event;
pub mod timestamp;
pub mod user;

pub use event::{RequestContext, RequestEvent, ResponseEvent};
pub use timestamp::Timestamp;
pub use user::{User, UserCredentials, UserListing};
