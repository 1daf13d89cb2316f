//!# Bus bit timing
//! Maps a peripheral clock frequency and a requested bit rate to legal values
//! for the bit timing register: prescaler plus the two time segments either
//! side of the sample point.
//!
//! ```
//!# use bxcan_driver::timing::BitTiming;
//!#
//! let timing = BitTiming::from_bit_rate(36_000_000, 1_000_000).unwrap();
//!
//! assert_eq!(timing.prescaler, 4);
//! assert_eq!(timing.sample_point_per_mille(), 888);
//! ```

use log::debug;

/// Smallest legal prescaler value
pub const MIN_PRESCALER: u32 = 1;

/// Largest value representable in the 10-bit prescaler field
pub const MAX_PRESCALER: u32 = 1024;

/// Sample points at or above this bound are rejected
const MAX_SAMPLE_POINT_PER_MILLE: u16 = 900;

/// Possible failures when deriving bus timing
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum TimingError {
    /// No quanta-per-bit count evenly divides the clock for the requested rate
    NoValidPrescaler,
    /// The derived prescaler does not fit the 10-bit register field
    PrescalerOutOfRange(u32),
    /// No legal segment split places the sample point inside the allowed window
    SamplePointUnattainable,
}

/// Legal bus timing parameters for one bit rate.
///
/// Segment values are quanta counts, not raw register fields; the register
/// encoding subtracts one from each.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BitTiming {
    /// Clock divisor generating the time quantum, 1..=1024
    pub prescaler: u16,
    /// Quanta between the start of the bit and the sample point, excluding the sync quantum
    pub time_segment_1: u8,
    /// Quanta between the sample point and the end of the bit
    pub time_segment_2: u8,
}

impl BitTiming {
    /// Derives timing parameters for the given peripheral clock and bit rate.
    ///
    /// Pure and deterministic. Bit rates that do not divide the clock exactly
    /// lose precision silently; that loss is inherent to the quantum search.
    pub fn from_bit_rate(clock_hz: u32, bit_rate: u32) -> Result<Self, TimingError> {
        if bit_rate == 0 {
            return Err(TimingError::NoValidPrescaler);
        }

        let max_quanta_per_bit: u8 = if bit_rate >= 1_000_000 { 10 } else { 17 };
        let prescaler_bs = clock_hz / bit_rate;

        // Search for the highest quanta count whose prescaler divides evenly
        let mut quanta_sum = max_quanta_per_bit - 1;
        while prescaler_bs % (1 + u32::from(quanta_sum)) != 0 {
            if quanta_sum <= 2 {
                debug!("no quanta count divides {clock_hz} Hz evenly for {bit_rate} bit/s");
                return Err(TimingError::NoValidPrescaler);
            }
            quanta_sum -= 1;
        }

        let prescaler = prescaler_bs / (1 + u32::from(quanta_sum));
        if !(MIN_PRESCALER..=MAX_PRESCALER).contains(&prescaler) {
            debug!("prescaler {prescaler} outside 1..=1024 for {bit_rate} bit/s");
            return Err(TimingError::PrescalerOutOfRange(prescaler));
        }

        // The recommended sample point location is 7/8 of the bit time. Split
        // the quanta so that segment 1 lands as close to it as possible, then
        // nudge the split back inside the legal window.
        let mut segment_1 = (7 * quanta_sum - 1 + 4) / 8;
        let min_sample_point_per_mille: u16 = if bit_rate >= 1_000_000 { 750 } else { 850 };

        if sample_point_per_mille(segment_1, quanta_sum) >= MAX_SAMPLE_POINT_PER_MILLE {
            segment_1 -= 1;
        }

        if sample_point_per_mille(segment_1, quanta_sum) < min_sample_point_per_mille {
            segment_1 += 1;
        }

        if sample_point_per_mille(segment_1, quanta_sum) >= MAX_SAMPLE_POINT_PER_MILLE {
            debug!("no sample point below {MAX_SAMPLE_POINT_PER_MILLE} per mille for {bit_rate} bit/s");
            return Err(TimingError::SamplePointUnattainable);
        }

        Ok(Self {
            prescaler: prescaler as u16,
            time_segment_1: segment_1,
            time_segment_2: quanta_sum - segment_1,
        })
    }

    /// Sample point these parameters place, in parts per thousand of the bit time
    pub fn sample_point_per_mille(&self) -> u16 {
        sample_point_per_mille(self.time_segment_1, self.time_segment_1 + self.time_segment_2)
    }
}

fn sample_point_per_mille(segment_1: u8, quanta_sum: u8) -> u16 {
    (1000 * (1 + u32::from(segment_1)) / (1 + u32::from(quanta_sum))) as u16
}
