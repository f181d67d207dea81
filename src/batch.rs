//! Lane-parallel batch hashing.
//!
//! A batch is a flat `u64` buffer, four words per job. It is split across
//! `count` lanes by stride: lane `i` owns jobs `i, i + count, i + 2 * count, ...`
//! and the matching output slots. Lanes share nothing but the compiled-in
//! tables, so each runs as an independent rayon task with no locking.

use crate::error::{Error, Result};
use crate::field::GoldilocksField;
use crate::poseidon::{hash, NUM_HASH_OUT_ELTS};
use rayon::prelude::*;
use std::iter::StepBy;
use std::ops::Range;
use tracing::{debug, info};

/// Words per job, on both the input and the output side.
pub const JOB_WORDS: usize = NUM_HASH_OUT_ELTS;

/// Borrowed view of a batch of 4-word jobs.
#[derive(Debug, Clone, Copy)]
pub struct BatchView<'a> {
    words: &'a [u64],
}

impl<'a> BatchView<'a> {
    /// Wraps `words`, which must hold a whole number of jobs.
    pub fn new(words: &'a [u64]) -> Result<Self> {
        if words.len() % JOB_WORDS != 0 {
            return Err(Error::InputLength {
                got: words.len(),
                chunk: JOB_WORDS,
            });
        }
        Ok(Self { words })
    }

    /// Number of jobs.
    pub fn num_jobs(&self) -> usize {
        self.words.len() / JOB_WORDS
    }

    /// Whether the batch has no jobs.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The underlying words.
    pub fn as_words(&self) -> &'a [u64] {
        self.words
    }

    /// Job `j` as field elements, or `None` past the end.
    pub fn job(&self, j: usize) -> Option<[GoldilocksField; JOB_WORDS]> {
        let start = j.checked_mul(JOB_WORDS)?;
        let words = self.words.get(start..start + JOB_WORDS)?;
        let mut out = [GoldilocksField::ZERO; JOB_WORDS];
        for (x, &w) in out.iter_mut().zip(words) {
            *x = GoldilocksField::from_noncanonical_u64(w);
        }
        Some(out)
    }

    /// Jobs in order.
    pub fn iter(&self) -> impl Iterator<Item = [GoldilocksField; JOB_WORDS]> + 'a {
        self.words
            .chunks_exact(JOB_WORDS)
            .map(|chunk| core::array::from_fn(|i| GoldilocksField::from_noncanonical_u64(chunk[i])))
    }

    /// Sub-view of `len` jobs starting at job `start`.
    pub fn slice(&self, start: usize, len: usize) -> Option<BatchView<'a>> {
        let end = start.checked_add(len)?;
        if end > self.num_jobs() {
            return None;
        }
        Some(Self {
            words: &self.words[start * JOB_WORDS..end * JOB_WORDS],
        })
    }
}

/// One worker's position in the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    index: usize,
    count: usize,
}

impl Lane {
    /// Lane `index` of `count`.
    pub fn new(index: usize, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(Error::ZeroLaneCount);
        }
        if index >= count {
            return Err(Error::LaneOutOfRange { index, count });
        }
        Ok(Self { index, count })
    }

    /// This lane's index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Total number of lanes.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Job indices owned by this lane in a batch of `num_jobs`.
    pub fn jobs(&self, num_jobs: usize) -> StepBy<Range<usize>> {
        (self.index..num_jobs.max(self.index)).step_by(self.count)
    }

    /// How many jobs this lane owns in a batch of `num_jobs`.
    pub fn job_count(&self, num_jobs: usize) -> usize {
        if num_jobs <= self.index {
            0
        } else {
            (num_jobs - self.index).div_ceil(self.count)
        }
    }
}

/// Hashes every job owned by `lane`.
///
/// `slots[n]` receives the digest of the lane's `n`-th job, i.e. job
/// `lane.index() + n * lane.count()`.
pub fn hash_lane(lane: Lane, view: BatchView<'_>, slots: &mut [&mut [u64]]) -> Result<()> {
    let expected = lane.job_count(view.num_jobs());
    if slots.len() != expected {
        return Err(Error::OutputLength {
            expected: expected * JOB_WORDS,
            got: slots.iter().map(|s| s.len()).sum(),
        });
    }

    if let Some(slot) = slots.iter().find(|s| s.len() != JOB_WORDS) {
        return Err(Error::OutputLength {
            expected: JOB_WORDS,
            got: slot.len(),
        });
    }

    for (job, slot) in lane.jobs(view.num_jobs()).zip(slots.iter_mut()) {
        let input = view.job(job).ok_or(Error::JobOutOfRange {
            job,
            num_jobs: view.num_jobs(),
        })?;
        slot.copy_from_slice(&hash(input).to_u64s());
    }
    Ok(())
}

/// Splits `output` into 4-word slots and deals them out by `job % count`.
fn partition_slots(output: &mut [u64], count: usize) -> Vec<Vec<&mut [u64]>> {
    let per_lane = (output.len() / JOB_WORDS).div_ceil(count);
    let mut lanes: Vec<Vec<&mut [u64]>> = (0..count).map(|_| Vec::with_capacity(per_lane)).collect();
    for (job, slot) in output.chunks_exact_mut(JOB_WORDS).enumerate() {
        lanes[job % count].push(slot);
    }
    lanes
}

/// Hashes `input` into `output` across `lanes` parallel lanes.
///
/// `output` must be exactly as long as `input`; digest `j` lands in words
/// `4j..4j + 4` regardless of which lane computed it.
pub fn hash_batch_into(input: &[u64], output: &mut [u64], lanes: usize) -> Result<()> {
    if lanes == 0 {
        return Err(Error::ZeroLaneCount);
    }
    let view = BatchView::new(input)?;
    if output.len() != input.len() {
        return Err(Error::OutputLength {
            expected: input.len(),
            got: output.len(),
        });
    }

    // Lanes past the last job would own nothing.
    let lanes = lanes.min(view.num_jobs()).max(1);
    debug!(
        "Hashing {} jobs across {} lanes on {} threads",
        view.num_jobs(),
        lanes,
        rayon::current_num_threads()
    );
    let start = std::time::Instant::now();

    let mut slots = partition_slots(output, lanes);
    slots
        .par_iter_mut()
        .enumerate()
        .try_for_each(|(index, lane_slots)| {
            let lane = Lane::new(index, lanes)?;
            hash_lane(lane, view, lane_slots)
        })?;

    info!(
        "Hashed {} jobs in {:.2}ms",
        view.num_jobs(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

/// Allocating form of [`hash_batch_into`].
pub fn hash_batch(input: &[u64], lanes: usize) -> Result<Vec<u64>> {
    let mut output = vec![0u64; input.len()];
    hash_batch_into(input, &mut output, lanes)?;
    Ok(output)
}

/// Single-threaded reference: hashes jobs one after another.
pub fn hash_sequential(input: &[u64]) -> Result<Vec<u64>> {
    let view = BatchView::new(input)?;
    let mut output = Vec::with_capacity(input.len());
    for job in view.iter() {
        output.extend_from_slice(&hash(job).to_u64s());
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_rejects_partial_job() {
        assert!(matches!(
            BatchView::new(&[1, 2, 3]),
            Err(Error::InputLength { got: 3, chunk: 4 })
        ));
        assert!(BatchView::new(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_view_job_and_slice() {
        let words: Vec<u64> = (0..12).collect();
        let view = BatchView::new(&words).unwrap();
        assert_eq!(view.num_jobs(), 3);
        assert_eq!(view.job(1).unwrap()[0].to_canonical_u64(), 4);
        assert!(view.job(3).is_none());

        let tail = view.slice(1, 2).unwrap();
        assert_eq!(tail.as_words(), &words[4..]);
        assert!(view.slice(2, 2).is_none());
        assert_eq!(view.iter().count(), 3);
    }

    #[test]
    fn test_lane_validation() {
        assert!(matches!(Lane::new(0, 0), Err(Error::ZeroLaneCount)));
        assert!(matches!(
            Lane::new(3, 3),
            Err(Error::LaneOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn test_lane_jobs_stride() {
        let lane = Lane::new(1, 3).unwrap();
        assert_eq!(lane.jobs(8).collect::<Vec<_>>(), vec![1, 4, 7]);
        assert_eq!(lane.job_count(8), 3);
        assert_eq!(lane.jobs(1).count(), 0);
        assert_eq!(lane.job_count(1), 0);
    }

    #[test]
    fn test_lanes_cover_every_job_once() {
        let num_jobs = 17;
        for count in 1..=20 {
            let mut seen = vec![0u32; num_jobs];
            for index in 0..count {
                let lane = Lane::new(index, count).unwrap();
                assert_eq!(lane.jobs(num_jobs).count(), lane.job_count(num_jobs));
                for job in lane.jobs(num_jobs) {
                    seen[job] += 1;
                }
            }
            assert!(seen.iter().all(|&n| n == 1), "count = {}", count);
        }
    }

    #[test]
    fn test_hash_lane_slot_mismatch() {
        let words = [0u64; 8];
        let view = BatchView::new(&words).unwrap();
        let lane = Lane::new(0, 1).unwrap();
        let mut out = [0u64; 4];
        let mut slots = vec![&mut out[..]];
        assert!(matches!(
            hash_lane(lane, view, &mut slots),
            Err(Error::OutputLength { .. })
        ));
    }

    #[test]
    fn test_batch_matches_sequential() {
        let words: Vec<u64> = (0..40u64).map(|i| i.wrapping_mul(0x9e37_79b9_7f4a_7c15)).collect();
        let expected = hash_sequential(&words).unwrap();
        for lanes in [1, 2, 3, 7, 10, 16] {
            assert_eq!(hash_batch(&words, lanes).unwrap(), expected, "lanes = {}", lanes);
        }
    }

    #[test]
    fn test_hash_lane_bad_slot_leaves_output_untouched() {
        let words: Vec<u64> = (0..12).collect();
        let view = BatchView::new(&words).unwrap();
        let lane = Lane::new(0, 1).unwrap();
        let mut first = [0u64; 4];
        let mut second = [0u64; 4];
        let mut short = [0u64; 3];
        let mut slots = vec![&mut first[..], &mut second[..], &mut short[..]];
        assert!(matches!(
            hash_lane(lane, view, &mut slots),
            Err(Error::OutputLength { expected: 4, got: 3 })
        ));
        assert_eq!(first, [0; 4]);
        assert_eq!(second, [0; 4]);
    }

    #[test]
    fn test_job_errors_name_the_job() {
        let err = Error::JobOutOfRange { job: 9, num_jobs: 4 };
        assert_eq!(err.to_string(), "job 9 out of range for a batch of 4 jobs");
        // Lanes never see a job past the end of the view.
        let lane = Lane::new(3, 8).unwrap();
        assert_eq!(lane.jobs(2).count(), 0);
    }

    #[test]
    fn test_batch_errors() {
        assert!(matches!(hash_batch(&[0; 4], 0), Err(Error::ZeroLaneCount)));
        let mut out = [0u64; 3];
        assert!(matches!(
            hash_batch_into(&[0; 4], &mut out, 1),
            Err(Error::OutputLength { expected: 4, got: 3 })
        ));
    }
}
