//! Answer Verification
//!
//! Bounded verification and self-correction of draft answers:
//!
//! - `checks` - Numeric, timeline, and grounding checks
//! - `corrector` - The verify -> correct -> re-verify loop

pub mod checks;
pub mod corrector;

pub use checks::{extract_numbers, VerificationOutcome, Verifier, VerifierConfig};
pub use corrector::{ResponseGenerator, VERIFICATION_WARNING_PREFIX};
