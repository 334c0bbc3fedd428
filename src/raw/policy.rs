// Growth policy for the bucket array.
//
// Bucket counts are drawn from a fixed prime ladder; primes keep the
// modulo reduction well distributed even when user hashes cluster on
// power-of-two strides. The policy memoizes the element count at which
// the next resize becomes necessary, so the per-insert check is a
// single integer comparison.

/// Prime bucket counts, roughly doubling past the small sizes.
///
/// The final entry is the largest prime below `2^64`; requests beyond
/// it saturate there.
const PRIMES: [u64; 67] = [
    2,
    3,
    5,
    7,
    11,
    17,
    29,
    53,
    97,
    193,
    389,
    769,
    1543,
    3079,
    6151,
    12289,
    24593,
    49157,
    98317,
    196613,
    393241,
    786433,
    1572869,
    3145739,
    6291469,
    12582917,
    25165843,
    50331653,
    100663319,
    201326611,
    402653189,
    805306457,
    1610612741,
    3221225473,
    4294967291,
    8589934583,
    17179869143,
    34359738337,
    68719476731,
    137438953447,
    274877906899,
    549755813881,
    1099511627689,
    2199023255531,
    4398046511093,
    8796093022151,
    17592186044399,
    35184372088777,
    70368744177643,
    140737488355213,
    281474976710597,
    562949953421231,
    1125899906842597,
    2251799813685119,
    4503599627370449,
    9007199254740881,
    18014398509481951,
    36028797018963913,
    72057594037927931,
    144115188075855859,
    288230376151711717,
    576460752303423433,
    1152921504606846883,
    2305843009213693951,
    4611686018427387847,
    9223372036854775783,
    18446744073709551557,
];

// The smallest ladder prime at least `min`.
fn next_prime(min: u64) -> u64 {
    let i = PRIMES.partition_point(|&p| p < min);
    match PRIMES.get(i) {
        Some(&p) => p,
        None => PRIMES[PRIMES.len() - 1],
    }
}

// Converts a ladder prime to a bucket count, saturating on 32-bit
// targets where the upper ladder does not fit.
fn to_count(prime: u64) -> usize {
    usize::try_from(prime).unwrap_or(usize::MAX)
}

/// When and how far the bucket array grows.
///
/// The defaults (load factor `1.0`, growth factor `2.0`) keep chains
/// one element long on average and double the array when they are
/// exceeded. The memoized resize threshold starts at zero, which is
/// what forces the very first insertion into an empty table to
/// allocate a real bucket array.
#[derive(Clone, Debug)]
pub struct RehashPolicy {
    max_load_factor: f32,
    growth_factor: f32,
    // Element count above which a rehash is required; 0 forces the
    // next check to recompute (and grow the shared empty array).
    next_resize: usize,
}

impl RehashPolicy {
    pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;
    pub const DEFAULT_GROWTH_FACTOR: f32 = 2.0;

    /// A policy with the default load and growth factors.
    pub fn new() -> RehashPolicy {
        RehashPolicy::with_factors(
            RehashPolicy::DEFAULT_MAX_LOAD_FACTOR,
            RehashPolicy::DEFAULT_GROWTH_FACTOR,
        )
    }

    /// A policy with the given factors.
    ///
    /// # Panics
    ///
    /// Panics if `max_load_factor` is not strictly positive or
    /// `growth_factor` is less than one.
    pub fn with_factors(max_load_factor: f32, growth_factor: f32) -> RehashPolicy {
        assert!(
            max_load_factor > 0.0 && max_load_factor.is_finite(),
            "max load factor must be positive and finite"
        );
        assert!(
            growth_factor >= 1.0 && growth_factor.is_finite(),
            "growth factor must be at least one"
        );

        RehashPolicy {
            max_load_factor,
            growth_factor,
            next_resize: 0,
        }
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Changes the load factor and drops the memoized threshold so the
    /// next check re-evaluates under the new factor.
    pub fn set_max_load_factor(&mut self, max_load_factor: f32) {
        assert!(
            max_load_factor > 0.0 && max_load_factor.is_finite(),
            "max load factor must be positive and finite"
        );
        self.max_load_factor = max_load_factor;
        self.next_resize = 0;
    }

    pub fn growth_factor(&self) -> f32 {
        self.growth_factor
    }

    pub fn set_growth_factor(&mut self, growth_factor: f32) {
        assert!(
            growth_factor >= 1.0 && growth_factor.is_finite(),
            "growth factor must be at least one"
        );
        self.growth_factor = growth_factor;
    }

    /// The smallest ladder bucket count that holds `elements` without
    /// exceeding the load factor.
    pub fn bucket_count_for(&self, elements: usize) -> usize {
        to_count(next_prime(self.min_buckets(elements)))
    }

    /// The smallest ladder bucket count at least `min` that also holds
    /// `elements` within the load factor.
    pub fn bucket_count_at_least(&self, min: usize, elements: usize) -> usize {
        to_count(next_prime(u64::max(min as u64, self.min_buckets(elements))))
    }

    // Minimum (real) bucket count for `elements` under the load factor.
    fn min_buckets(&self, elements: usize) -> u64 {
        (elements as f64 / self.max_load_factor as f64).ceil() as u64
    }

    /// Whether inserting `additions` more elements into `buckets`
    /// buckets requires growing first, and to what count.
    ///
    /// The common case is a single comparison against the memoized
    /// threshold. When the threshold is stale (newly constructed
    /// table, or the load factor changed), it is recomputed here; if
    /// the current array still suffices, the refreshed memo makes the
    /// following checks cheap again.
    pub fn rehash_required(
        &mut self,
        buckets: usize,
        elements: usize,
        additions: usize,
    ) -> Option<usize> {
        let total = elements + additions;
        if total <= self.next_resize {
            return None;
        }

        // A count of 1 is the shared empty array; size the first real
        // array purely by need, with no growth-factor floor.
        let current = if buckets == 1 { 0 } else { buckets };

        let needed = self.min_buckets(total);
        if needed <= current as u64 {
            // Load is still fine; the memo was stale.
            self.next_resize = self.threshold(buckets);
            return None;
        }

        let grown = (current as f64 * self.growth_factor as f64).ceil() as u64;
        Some(to_count(next_prime(u64::max(needed, grown))))
    }

    /// Memoizes the resize threshold after the array changed to
    /// `buckets` buckets.
    pub fn record(&mut self, buckets: usize) {
        self.next_resize = self.threshold(buckets);
    }

    /// Drops the memo; the next check recomputes. Used when the table
    /// reverts to the shared empty array.
    pub fn forget(&mut self) {
        self.next_resize = 0;
    }

    // Largest element count `buckets` buckets hold within the load
    // factor.
    fn threshold(&self, buckets: usize) -> usize {
        (buckets as f64 * self.max_load_factor as f64).floor() as usize
    }
}

impl Default for RehashPolicy {
    fn default() -> RehashPolicy {
        RehashPolicy::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_is_sorted() {
        assert!(PRIMES.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(next_prime(0), 2);
        assert_eq!(next_prime(2), 2);
        assert_eq!(next_prime(4), 5);
        assert_eq!(next_prime(10), 11);
        assert_eq!(next_prime(u64::MAX), 18446744073709551557);
    }

    #[test]
    fn first_insert_always_grows() {
        // The memo starts at zero, so even a 1-bucket (shared empty)
        // table grows on the first insertion.
        let mut policy = RehashPolicy::new();
        assert_eq!(policy.rehash_required(1, 0, 1), Some(2));
    }

    #[test]
    fn growth_sequence_from_two_buckets() {
        let mut policy = RehashPolicy::new();
        assert_eq!(policy.bucket_count_for(2), 2);
        policy.record(2);

        // Two elements fit; the third forces 2 -> 5 (doubling past 4).
        assert_eq!(policy.rehash_required(2, 0, 1), None);
        assert_eq!(policy.rehash_required(2, 1, 1), None);
        assert_eq!(policy.rehash_required(2, 2, 1), Some(5));
        policy.record(5);

        // Five fit; the sixth forces 5 -> 11.
        assert_eq!(policy.rehash_required(5, 4, 1), None);
        assert_eq!(policy.rehash_required(5, 5, 1), Some(11));
    }

    #[test]
    fn stale_memo_is_refreshed() {
        let mut policy = RehashPolicy::new();
        policy.record(97);
        policy.set_max_load_factor(0.5);

        // 10 elements in 97 buckets is fine at load 0.5; the check
        // refreshes the memo rather than growing.
        assert_eq!(policy.rehash_required(97, 9, 1), None);
        assert_eq!(policy.next_resize, 48);

        // And past the refreshed threshold it grows again, doubling
        // 97 to 194 and snapping up the ladder.
        assert_eq!(policy.rehash_required(97, 48, 1), Some(389));
    }

    #[test]
    fn load_factor_scales_counts() {
        let policy = RehashPolicy::with_factors(0.25, 2.0);
        assert_eq!(policy.bucket_count_for(3), 17);

        let policy = RehashPolicy::with_factors(4.0, 2.0);
        assert_eq!(policy.bucket_count_for(8), 2);
    }
}
