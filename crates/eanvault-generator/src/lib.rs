pub mod masked;

pub use masked::EanGenerator;

use eanvault_core::error::Result;
use eanvault_core::{Ean13, Mask, UsedCodes};

/// Trait for producing batches of fresh codes.
///
/// Implementations are pure: they read the exclusion set but never modify
/// it, and they don't interact with storage. Merging the batch into the
/// issued set is the caller's job.
pub trait Generator: Send + Sync + 'static {
    /// Produces `count` distinct codes matching `mask`, none of them in `used`.
    fn generate(&self, mask: &Mask, count: usize, used: &UsedCodes) -> Result<Vec<Ean13>>;
}

/// Generates `count` codes from a raw mask string with the default settings.
///
/// Fails with `MaskTooLong` before any attempt if the mask is longer than 12
/// characters, and with `GenerationExhausted` if the retry budget runs out.
pub fn generate(mask: &str, count: usize, used: &UsedCodes) -> Result<Vec<Ean13>> {
    let mask = Mask::new(mask)?;
    EanGenerator::builder().build().generate(&mask, count, used)
}
