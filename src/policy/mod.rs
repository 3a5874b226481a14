//! Access policy subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path + referer
//!     → identity.rs (recognize /gh|github/owner/name and /npm/name shapes)
//!     → gates.rs (file type → repo → package → referer, first failure wins)
//!     → Ok(()) or Rejection { status, message }
//! ```
//!
//! # Design Decisions
//! - Every predicate is pure and total; malformed input never errors
//! - Absent identity passes (only recognized shapes are gated)
//! - Unparseable referers fail open (treated as unknown, not blocked)

pub mod gates;
pub mod identity;

pub use gates::{evaluate, Rejection};
