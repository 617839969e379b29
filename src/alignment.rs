//! Calendar-aware slot alignment
//!
//! Some providers return a day as a flat list of values without a timestamp
//! per value. The list has to be mapped onto the true local slot index of the
//! day (see [`crate::windowing::day_slots`]), whose length changes on DST
//! transition days.

use crate::error::ParseError;

/// Where the tail of a transition day starts, in output and input positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOffsets {
    /// First output slot filled from the tail
    pub output: usize,
    /// First input value copied into `output`
    pub input: usize,
}

/// Provider-specific mapping of a sequential value list onto a day index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotProfile {
    /// Slots of a day without transition (96 for quarter-hours)
    pub nominal_slots: usize,
    /// Slots per hour (4 for quarter-hours)
    pub slots_per_hour: usize,
    /// Leading values copied unchanged on transition days
    pub head: usize,
    /// Spring-forward day (`nominal_slots - slots_per_hour` slots)
    pub short_day: SplitOffsets,
    /// Fall-back day (`nominal_slots + slots_per_hour` slots)
    pub long_day: SplitOffsets,
}

impl SlotProfile {
    /// EirGrid Smart Grid Dashboard quarter-hour series
    ///
    /// The dashboard always reports 96 rows. On the spring day rows 4..8 belong
    /// to the skipped hour and are dropped; on the autumn day rows 4..8 are
    /// dropped and the repeated hour (slots 4..12) is left without data.
    pub const EIRGRID_QUARTER_HOUR: SlotProfile = SlotProfile {
        nominal_slots: 96,
        slots_per_hour: 4,
        head: 4,
        short_day: SplitOffsets {
            output: 4,
            input: 8,
        },
        long_day: SplitOffsets {
            output: 12,
            input: 8,
        },
    };

    fn short_slots(&self) -> usize {
        self.nominal_slots.saturating_sub(self.slots_per_hour)
    }

    fn long_slots(&self) -> usize {
        self.nominal_slots + self.slots_per_hour
    }
}

/// Map a sequential value list onto `slot_count` local slots
///
/// - normal day: 1:1 positional mapping
/// - short or long day: the first `head` values are copied as they are, then
///   output from the profile's `output` offset is filled from input starting
///   at its `input` offset
///
/// Slots that receive no value stay `None`. A shorter input (e.g. a day still
/// in progress) fills as far as it reaches.
///
/// # Errors
///
/// [`ParseError::UnexpectedSlotCount`] if `slot_count` is none of the three
/// day lengths the profile knows.
///
/// # Examples
///
/// ```
/// # use grid_market_data::alignment::{align_sequence, SlotProfile};
/// let values: Vec<Option<f64>> = (0..96).map(|v| Some(v as f64)).collect();
///
/// // Spring-forward day: 92 local slots, input rows 4..8 are skipped
/// let aligned = align_sequence(92, &values, &SlotProfile::EIRGRID_QUARTER_HOUR).unwrap();
/// assert_eq!(aligned[3], Some(3.0));
/// assert_eq!(aligned[4], Some(8.0));
/// assert_eq!(aligned[91], Some(95.0));
/// ```
pub fn align_sequence(
    slot_count: usize,
    values: &[Option<f64>],
    profile: &SlotProfile,
) -> Result<Vec<Option<f64>>, ParseError> {
    let mut aligned = vec![None; slot_count];

    let split = if slot_count == profile.nominal_slots {
        None
    } else if slot_count == profile.short_slots() {
        Some(profile.short_day)
    } else if slot_count == profile.long_slots() {
        Some(profile.long_day)
    } else {
        return Err(ParseError::UnexpectedSlotCount {
            actual: slot_count,
            nominal: profile.nominal_slots,
        });
    };

    match split {
        None => copy_from(&mut aligned, 0, values, 0),
        Some(offsets) => {
            let head = profile.head.min(slot_count);
            copy_from(&mut aligned[..head], 0, values, 0);
            copy_from(&mut aligned, offsets.output, values, offsets.input);
        }
    }

    Ok(aligned)
}

fn copy_from(out: &mut [Option<f64>], out_offset: usize, input: &[Option<f64>], in_offset: usize) {
    let targets = out.iter_mut().skip(out_offset);
    let sources = input.iter().skip(in_offset);
    for (slot, value) in targets.zip(sources) {
        *slot = *value;
    }
}

/// Map 1-based settlement periods onto `slot_count` local slots
///
/// Period `n` lands in slot `n - 1`; settlement days already number their
/// periods 1..=46 / 48 / 50 on transition days. Later duplicates of a period
/// overwrite earlier ones.
///
/// # Errors
///
/// [`ParseError::PeriodOutOfRange`] for a period outside `1..=slot_count`.
///
/// # Examples
///
/// ```
/// # use grid_market_data::alignment::align_by_period;
/// let aligned = align_by_period(48, &[(1, Some(10.0)), (48, Some(20.0))]).unwrap();
/// assert_eq!(aligned[0], Some(10.0));
/// assert_eq!(aligned[47], Some(20.0));
/// assert_eq!(aligned[1], None);
///
/// assert!(align_by_period(46, &[(47, Some(1.0))]).is_err());
/// ```
pub fn align_by_period(
    slot_count: usize,
    periods: &[(i64, Option<f64>)],
) -> Result<Vec<Option<f64>>, ParseError> {
    let mut aligned = vec![None; slot_count];

    for &(period, value) in periods {
        let slot = usize::try_from(period.saturating_sub(1))
            .ok()
            .filter(|slot| *slot < slot_count)
            .ok_or(ParseError::PeriodOutOfRange {
                period,
                slots: slot_count,
            })?;
        aligned[slot] = value;
    }

    Ok(aligned)
}
