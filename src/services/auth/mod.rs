pub mod allow_list;
pub mod decision;
pub mod passphrase;
pub mod verifier;

pub use allow_list::AllowList;
pub use decision::{AuthDecision, RejectReason};
pub use passphrase::{Passphrase, PassphraseError, PassphraseSource, PassphraseStore};
pub use verifier::HmacVerifier;
