pub mod board;
pub mod config;
pub mod crm;
pub mod error;
pub mod models;
pub mod normalize;

pub use board::{merge_board_items, BoardAggregator, BoardClient, BoardSource};
pub use config::RelayConfig;
pub use crm::{CallEventOutcome, CrmClient, CrmGateway};
pub use error::RelayError;
pub use models::board::{AggregatedItems, BoardItem};
pub use models::contact::{ContactRecord, CustomField};
pub use normalize::normalize_call_event;
