pub mod author;
pub mod dissemination;
pub mod links;
pub mod range;
pub mod responses;
pub mod router;
pub mod state;
pub mod templates;

pub use responses::{PageError, json_error};
pub use state::AppState;
