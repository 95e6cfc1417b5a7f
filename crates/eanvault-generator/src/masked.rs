use crate::Generator;
use eanvault_core::error::{CoreError, Result};
use eanvault_core::{Ean13, Mask, UsedCodes, BODY_LEN};
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const MAX_PREALLOC: usize = 1 << 16;

/// Generates codes by filling the wildcards of a [`Mask`].
///
/// The first candidate of a batch is random. Each following candidate is
/// the previous accepted body plus one, spread over the wildcards, which
/// keeps a batch numerically clustered when the mask is a fixed prefix. If
/// that candidate is already taken the attempt falls back to random digits.
///
/// Every attempt counts against a budget of `retry_factor × count`; the
/// call fails once the budget is spent and the batch is still short. A
/// batch larger than the codes the mask has left fails up front.
#[derive(Debug, Clone, TypedBuilder)]
pub struct EanGenerator {
    #[builder(default = 2)]
    retry_factor: usize,
}

impl EanGenerator {
    pub fn retry_factor(&self) -> usize {
        self.retry_factor
    }

    /// Same as [`Generator::generate`], drawing random digits from `rng`.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        mask: &Mask,
        count: usize,
        used: &UsedCodes,
        rng: &mut R,
    ) -> Result<Vec<Ean13>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let free = free_slots(mask, used);
        if count as u128 > free {
            debug!(mask = %mask, count, free = %free, "mask cannot hold the requested batch");
            return Err(CoreError::GenerationExhausted {
                requested: count,
                produced: 0,
                tries: 0,
            });
        }

        let budget = count as u128 * self.retry_factor as u128;
        let mut batch: Vec<Ean13> = Vec::with_capacity(count.min(MAX_PREALLOC));
        let mut issued: HashSet<Ean13> = HashSet::with_capacity(count.min(MAX_PREALLOC));
        let mut tries: usize = 0;

        debug!(mask = %mask, count, budget = %budget, "generating codes");

        while batch.len() < count {
            if tries as u128 > budget {
                debug!(mask = %mask, produced = batch.len(), tries, "retry budget exhausted");
                return Err(CoreError::GenerationExhausted {
                    requested: count,
                    produced: batch.len(),
                    tries,
                });
            }
            tries += 1;

            let taken = |code: &Ean13| used.contains(code) || issued.contains(code);

            let candidate = match batch.last() {
                Some(last) => {
                    let next = sequential_candidate(mask, last)?;
                    if taken(&next) {
                        random_candidate(mask, rng)?
                    } else {
                        next
                    }
                }
                None => random_candidate(mask, rng)?,
            };

            if taken(&candidate) {
                trace!(code = %candidate, "candidate already issued");
                continue;
            }

            issued.insert(candidate.clone());
            batch.push(candidate);
        }

        debug!(mask = %mask, count, tries, "generated codes");
        Ok(batch)
    }
}

impl Default for EanGenerator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Generator for EanGenerator {
    fn generate(&self, mask: &Mask, count: usize, used: &UsedCodes) -> Result<Vec<Ean13>> {
        self.generate_with_rng(mask, count, used, &mut rand::rng())
    }
}

/// Codes the mask can still produce: its whole space minus the used codes
/// it covers.
fn free_slots(mask: &Mask, used: &UsedCodes) -> u128 {
    let space = 10u128.pow(mask.wildcard_count() as u32);
    let taken = used.iter().filter(|code| mask.matches(code)).count() as u128;
    space.saturating_sub(taken)
}

/// The last body plus one, as a zero-padded 12-digit source.
fn sequential_candidate(mask: &Mask, last: &Ean13) -> Result<Ean13> {
    let next = format!("{:0width$}", last.body_value() + 1, width = BODY_LEN);
    candidate(mask, next.as_bytes())
}

/// One uniform digit per wildcard.
fn random_candidate<R: Rng + ?Sized>(mask: &Mask, rng: &mut R) -> Result<Ean13> {
    let source: Vec<u8> = (0..mask.wildcard_count())
        .map(|_| b'0' + rng.random_range(0..10u8))
        .collect();
    let body = mask.fill_wildcards(&source);
    to_code(&body)
}

fn candidate(mask: &Mask, source: &[u8]) -> Result<Ean13> {
    to_code(&mask.fill(source))
}

fn to_code(body: &[u8]) -> Result<Ean13> {
    let body = std::str::from_utf8(body).map_err(|e| CoreError::InvalidCode(e.to_string()))?;
    Ean13::from_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn mask(s: &str) -> Mask {
        Mask::new(s).unwrap()
    }

    #[test]
    fn batch_is_unique_and_checksum_valid() {
        let generator = EanGenerator::default();
        let codes = generator
            .generate_with_rng(&mask("160x"), 50, &UsedCodes::new(), &mut rng())
            .unwrap();

        assert_eq!(codes.len(), 50);
        let distinct: HashSet<&Ean13> = codes.iter().collect();
        assert_eq!(distinct.len(), 50);
        for code in &codes {
            assert!(code.as_str().starts_with("160"));
            // re-parsing validates the check digit
            assert_eq!(&Ean13::new(code.as_str()).unwrap(), code);
        }
    }

    #[test]
    fn prefix_mask_produces_consecutive_bodies() {
        let generator = EanGenerator::default();
        let codes = generator
            .generate_with_rng(&mask("160"), 5, &UsedCodes::new(), &mut rng())
            .unwrap();

        for pair in codes.windows(2) {
            assert_eq!(pair[1].body_value(), pair[0].body_value() + 1);
        }
    }

    #[test]
    fn sequential_collision_falls_back_to_random() {
        let generator = EanGenerator::default();
        let first = generator
            .generate_with_rng(&mask("160"), 1, &UsedCodes::new(), &mut rng())
            .unwrap()
            .remove(0);
        let next = sequential_candidate(&mask("160"), &first).unwrap();
        let used: UsedCodes = [next.clone()].into_iter().collect();

        // Same seed, so the first candidate repeats and the successor is taken.
        let codes = generator
            .generate_with_rng(&mask("160"), 2, &used, &mut rng())
            .unwrap();

        assert_eq!(codes[0], first);
        assert_ne!(codes[1], next);
        assert!(!used.contains(&codes[1]));
    }

    #[test]
    fn sequential_candidate_carries_into_fixed_prefix() {
        let last = Ean13::from_body("160999999999").unwrap();
        let next = sequential_candidate(&mask("160"), &last).unwrap();
        // 161000000000 spread over positions 3..12 keeps the prefix
        assert_eq!(next.body(), "160000000000");
    }

    #[test]
    fn sequential_candidate_keeps_leading_zeros() {
        let last = Ean13::from_body("000000000041").unwrap();
        let next = sequential_candidate(&mask(""), &last).unwrap();
        assert_eq!(next.body(), "000000000042");
    }

    #[test]
    fn excluded_codes_are_never_returned() {
        // one wildcard: ten possible codes, nine of them already used
        let m = mask("12345678901");
        let used: UsedCodes = (0..9)
            .map(|d| Ean13::from_body(&format!("12345678901{}", d)).unwrap())
            .collect();

        let codes = EanGenerator::builder()
            .retry_factor(100)
            .build()
            .generate_with_rng(&m, 1, &used, &mut rng())
            .unwrap();

        assert_eq!(codes[0].body(), "123456789019");
    }

    #[test]
    fn exhausts_up_front_when_mask_space_is_too_small() {
        let err = EanGenerator::default()
            .generate_with_rng(&mask("12345678901"), 11, &UsedCodes::new(), &mut rng())
            .unwrap_err();

        assert_eq!(
            err,
            CoreError::GenerationExhausted {
                requested: 11,
                produced: 0,
                tries: 0,
            }
        );
    }

    #[test]
    fn used_codes_inside_the_mask_shrink_its_space() {
        let m = mask("12345678901");
        let used: UsedCodes = (0..5)
            .map(|d| Ean13::from_body(&format!("12345678901{}", d)).unwrap())
            .chain([Ean13::from_body("999999999999").unwrap()])
            .collect();

        let err = EanGenerator::default()
            .generate_with_rng(&m, 6, &used, &mut rng())
            .unwrap_err();
        assert!(matches!(err, CoreError::GenerationExhausted { tries: 0, .. }));

        // the code outside the mask does not count against it
        let codes = EanGenerator::builder()
            .retry_factor(100)
            .build()
            .generate_with_rng(&m, 5, &used, &mut rng())
            .unwrap();
        assert_eq!(codes.len(), 5);
    }

    #[test]
    fn exhaustion_counts_every_attempt() {
        // budget 0 still allows one attempt, since attempts run while tries <= budget
        let err = EanGenerator::builder()
            .retry_factor(0)
            .build()
            .generate_with_rng(&mask("12345678901"), 2, &UsedCodes::new(), &mut rng())
            .unwrap_err();

        assert_eq!(
            err,
            CoreError::GenerationExhausted {
                requested: 2,
                produced: 1,
                tries: 1,
            }
        );
    }

    #[test]
    fn random_digits_are_drawn_per_wildcard() {
        // six wildcards at odd positions; a wrapped source would repeat digits
        let m = mask("1x2x3x4x5x6x");
        let codes = EanGenerator::default()
            .generate_with_rng(&m, 1, &UsedCodes::new(), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(m.matches(&codes[0]));

        // wildcards at positions 1 and 7 would share a digit with a wrapped source
        let mut rng = StdRng::seed_from_u64(1);
        let differs = (0..200).any(|_| {
            let body = random_candidate(&m, &mut rng).unwrap();
            let body = body.body().as_bytes();
            body[1] != body[7]
        });
        assert!(differs);
    }

    fn mask_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                3 => Just('x'),
                1 => (b'0'..=b'9').prop_map(char::from),
            ],
            0..=12,
        )
        .prop_map(|chars| chars.into_iter().collect())
    }

    proptest! {
        #[test]
        fn successful_batches_are_fresh_unique_and_match_the_mask(
            raw in mask_strategy(),
            count in 0usize..30,
            seed in any::<u64>(),
            used_bodies in prop::collection::vec(0u64..1_000_000_000_000, 0..30),
        ) {
            let m = Mask::new(&raw).unwrap();
            let used: UsedCodes = used_bodies
                .iter()
                .map(|b| Ean13::from_body(&format!("{:012}", b)).unwrap())
                .collect();
            let mut rng = StdRng::seed_from_u64(seed);

            match EanGenerator::default().generate_with_rng(&m, count, &used, &mut rng) {
                Ok(codes) => {
                    prop_assert_eq!(codes.len(), count);
                    let distinct: HashSet<&Ean13> = codes.iter().collect();
                    prop_assert_eq!(distinct.len(), count);
                    for code in &codes {
                        prop_assert!(!used.contains(code));
                        prop_assert!(m.matches(code));
                    }
                }
                Err(err) => {
                    let is_exhausted = matches!(err, CoreError::GenerationExhausted { .. });
                    prop_assert!(is_exhausted);
                }
            }
        }
    }
}
