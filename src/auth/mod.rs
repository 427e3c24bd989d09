//! Session credentials: token lifecycle, revocation tracking, password digests.

pub mod clock;
pub mod password;
pub mod revocation;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use password::{hash_password, verify_password};
pub use revocation::{InMemoryRevocations, RevocationStore};
pub use token::{Claims, IssuedToken, TokenKind, TokenManager, TokenPair};
