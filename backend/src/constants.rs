// =============================================================================
// Bridger Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// CONNECTION LINKS
// =============================================================================

/// Path on the public origin that the frontend routes to the connection landing screen
pub const CONNECT_PATH: &str = "/connect";

/// Query parameter carrying the opaque connection code
pub const CODE_PARAM: &str = "code";

/// Query parameter carrying the sharer's user id
pub const USER_PARAM: &str = "user";

/// Query parameter carrying the sharer's display name (optional)
pub const NAME_PARAM: &str = "name";

/// Separator between the parts of a connection code
pub const CODE_SEPARATOR: char = '_';

/// Number of random base36 characters at the end of a connection code
pub const CODE_NONCE_LENGTH: usize = 13;

/// Alphabet used for the random part of a connection code
pub const CODE_NONCE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

// =============================================================================
// USERS
// =============================================================================

/// Display name used when the identity directory knows nothing better
pub const UNKNOWN_USER_NAME: &str = "Unknown User";

/// Most people returned by one friend-suggestion query
pub const FRIEND_SUGGESTION_LIMIT: usize = 20;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default public origin used to build shareable links
pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:5173";

/// Default database pool size
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Default wait for a pooled database connection, in milliseconds
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_MS: u64 = 5000;

// =============================================================================
// DATABASE ERROR CODES
// =============================================================================

/// Postgres SQLSTATE for unique_violation
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// Postgres SQLSTATE for check_violation
pub const PG_CHECK_VIOLATION: &str = "23514";
