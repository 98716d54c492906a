pub mod claim_message;
pub mod wallet;

pub use claim_message::{ClaimMessage, SignedClaim};
pub use wallet::Wallet;
