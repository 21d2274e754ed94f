//! Plan view state
//!
//! Pure transitions over plan snapshots plus the session that owns the
//! single mutable view cell.

pub mod mutation;
pub mod reducer;
mod session;

pub use reducer::reduce;
pub use session::{Banner, BannerKind, PlannerSession, ViewState};
