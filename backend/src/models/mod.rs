pub mod connections;
pub mod users;

pub use connections::{Connection, ConnectionStatus, ConnectionView, NewConnection};
pub use users::{UserProfile, display_name_or_unknown};
