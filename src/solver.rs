use tracing::{debug, warn};

use crate::config::{DEFAULT_FABRIC_WIDTH_CM, SearchConfig};
use crate::demand::normalize;
use crate::error::CatalogError;
use crate::types::{CalculationResult, CutResult, FabricSize, default_fabric_sizes, round3};

/// Absorbs division noise when counting how many pieces fit (e.g. 0.3 / 0.1).
const FIT_EPSILON: f64 = 1e-9;

/// Subsets are enumerated as `u64` bitmasks.
const MAX_SUBSET_BITS: usize = 63;

/// Plans the cuts for one roll using the default search settings.
///
/// `sizes` falls back to the built-in catalogue when `None`. A non-positive or
/// non-numeric length yields an empty plan; the only error is a malformed
/// catalogue entry.
pub fn calculate_optimal_cuts(
    total_length: f64,
    sizes: Option<&[FabricSize]>,
) -> Result<CalculationResult, CatalogError> {
    calculate_optimal_cuts_with(
        total_length,
        sizes,
        DEFAULT_FABRIC_WIDTH_CM,
        SearchConfig::default(),
    )
}

pub fn calculate_optimal_cuts_with(
    total_length: f64,
    sizes: Option<&[FabricSize]>,
    fabric_width_cm: u32,
    config: SearchConfig,
) -> Result<CalculationResult, CatalogError> {
    if !is_usable_length(total_length) {
        return Ok(CalculationResult::empty(fabric_width_cm));
    }

    let defaults;
    let sizes = match sizes {
        Some(sizes) => sizes,
        None => {
            defaults = default_fabric_sizes();
            &defaults
        }
    };

    Ok(Solver::new(total_length, sizes, config)?
        .with_fabric_width(fabric_width_cm)
        .solve())
}

fn is_usable_length(length: f64) -> bool {
    length.is_finite() && length > 0.0
}

fn pieces_that_fit(length: f64, size: f64) -> u32 {
    if length <= 0.0 {
        return 0;
    }
    (length / size + FIT_EPSILON).floor() as u32
}

fn whole_millimetres(length: f64) -> Option<usize> {
    let mm = length * 1000.0;
    let rounded = mm.round();
    if rounded < 1.0 || (mm - rounded).abs() > 1e-6 {
        return None;
    }
    Some(rounded as usize)
}

/// One size's position in the depth-first search with its allowed counts.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    size: f64,
    priority: bool,
    min: u32,
    preferred: u32,
    window_max: u32,
    absolute_max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bounds {
    /// Counts limited to the proportional window.
    Window,
    /// Counts limited only by what physically fits.
    Absolute,
}

impl Slot {
    fn limit(&self, bounds: Bounds) -> u32 {
        match bounds {
            Bounds::Window => self.window_max,
            Bounds::Absolute => self.absolute_max,
        }
    }
}

/// Whole-millimetre lengths that `slots[i..]` can make up exactly, with each
/// slot taking at least `min` pieces and otherwise unbounded.
struct Reachability {
    tables: Vec<Vec<bool>>,
    tolerance_mm: f64,
}

impl Reachability {
    /// `None` when some size is not a whole number of millimetres, in which
    /// case the search runs without this pruning.
    fn build(parts: &[(f64, u32)], limit_mm: usize, tolerance: f64) -> Option<Self> {
        let steps = parts
            .iter()
            .map(|&(size, min)| whole_millimetres(size).map(|mm| (mm, min as usize)))
            .collect::<Option<Vec<_>>>()?;

        let mut tables = vec![Vec::new(); steps.len() + 1];
        let mut reach = vec![false; limit_mm + 1];
        reach[0] = true;
        tables[steps.len()] = reach.clone();

        for (i, &(step, min)) in steps.iter().enumerate().rev() {
            for t in step..=limit_mm {
                if reach[t - step] {
                    reach[t] = true;
                }
            }
            let shift = step.saturating_mul(min);
            if shift > 0 {
                let mut shifted = vec![false; limit_mm + 1];
                for t in shift..=limit_mm {
                    shifted[t] = reach[t - shift];
                }
                reach = shifted;
            }
            tables[i] = reach.clone();
        }

        Some(Self {
            tables,
            tolerance_mm: tolerance * 1000.0,
        })
    }

    /// Whether slots `index..` can bring `remaining` to within tolerance of zero.
    fn contains(&self, index: usize, remaining: f64) -> bool {
        let table = &self.tables[index];
        let x = remaining * 1000.0;
        let lo = (x - self.tolerance_mm + 1e-6).ceil().max(0.0);
        let hi = (x + self.tolerance_mm - 1e-6).floor();
        if hi < lo {
            return false;
        }
        let hi = (hi as usize).min(table.len() - 1);
        (lo as usize..=hi).any(|t| table[t])
    }
}

/// Everything the search consults to cut dead branches.
struct Pruning {
    capacity: Vec<f64>,
    reach: Option<Reachability>,
}

pub struct Solver {
    total_length: f64,
    sizes: Vec<FabricSize>,
    config: SearchConfig,
    fabric_width_cm: u32,
}

impl Solver {
    /// Validates `sizes` and recomputes their probabilities.
    pub fn new(
        total_length: f64,
        sizes: &[FabricSize],
        config: SearchConfig,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            total_length,
            sizes: normalize(sizes)?,
            config,
            fabric_width_cm: DEFAULT_FABRIC_WIDTH_CM,
        })
    }

    pub fn with_fabric_width(mut self, fabric_width_cm: u32) -> Self {
        self.fabric_width_cm = fabric_width_cm;
        self
    }

    pub fn solve(&self) -> CalculationResult {
        if !is_usable_length(self.total_length) {
            return CalculationResult::empty(self.fabric_width_cm);
        }

        debug!(
            total_length = self.total_length,
            sizes = self.sizes.len(),
            "searching for a zero-leftover plan"
        );
        if let Some(exact) = self.find_exact() {
            return exact;
        }

        let result = self.fallback();
        debug!(leftover = result.leftover, "no zero-leftover plan, used greedy fill");
        result
    }

    fn is_priority(&self, size: &FabricSize) -> bool {
        size.class(self.config.priority_threshold).is_priority()
    }

    /// Upper end of the reachability tables, or `None` past the configured limit.
    fn limit_mm(&self) -> Option<usize> {
        let limit = ((self.total_length + self.config.tolerance) * 1000.0).floor();
        (limit <= self.config.reachability_limit_mm as f64).then_some(limit as usize)
    }

    /// Looks for a combination that uses the whole roll. Returns `None` when
    /// every subset of optional sizes has been exhausted.
    pub fn find_exact(&self) -> Option<CalculationResult> {
        let mut by_probability = self.sizes.clone();
        by_probability.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        let (priority, optional): (Vec<FabricSize>, Vec<FabricSize>) = by_probability
            .into_iter()
            .partition(|s| self.is_priority(s));

        let max_sizes = self.config.max_optional_sizes.min(MAX_SUBSET_BITS);
        if optional.len() > max_sizes || priority.len() > max_sizes {
            warn!(
                priority = priority.len(),
                optional = optional.len(),
                limit = max_sizes,
                "too many sizes, skipping exact search"
            );
            return None;
        }

        let Some(limit_mm) = self.limit_mm() else {
            warn!(
                total_length = self.total_length,
                "roll too long for an exact search"
            );
            return None;
        };

        let everything: Vec<(f64, u32)> = self.sizes.iter().map(|s| (s.size, 0)).collect();
        if let Some(reach) = Reachability::build(&everything, limit_mm, self.config.tolerance)
            && !reach.contains(0, self.total_length)
        {
            debug!("no combination of sizes adds up to the roll");
            return None;
        }

        // Every priority size gets at least one piece if at all possible.
        // Otherwise drop as few as possible, least demanded first.
        let count = priority.len();
        for dropped in 0..=count {
            let drop_sets = (0..1u64 << count)
                .rev()
                .filter(|m| m.count_ones() as usize == dropped);
            for drop_set in drop_sets {
                let kept: Vec<FabricSize> = priority
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| drop_set & (1 << i) == 0)
                    .map(|(_, s)| *s)
                    .collect();
                if let Some(cuts) = self.sweep(&kept, &optional, limit_mm) {
                    debug!(dropped, "found zero-leftover plan");
                    return Some(CalculationResult {
                        cuts: merge_cuts(cuts),
                        leftover: 0.0,
                        total_used: round3(self.total_length),
                        fabric_width_cm: self.fabric_width_cm,
                    });
                }
            }
        }
        None
    }

    /// Tries every subset of `optional`, largest (all bits set) first.
    fn sweep(
        &self,
        priority: &[FabricSize],
        optional: &[FabricSize],
        limit_mm: usize,
    ) -> Option<Vec<CutResult>> {
        let subsets = 1u64 << optional.len();
        for mask in (0..subsets).rev() {
            let mut candidates = priority.to_vec();
            candidates.extend(
                optional
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, s)| *s),
            );
            if candidates.is_empty() {
                continue;
            }
            if let Some(cuts) = self.try_sizes(candidates, limit_mm) {
                debug!(mask, "optional subset yields an exact plan");
                return Some(cuts);
            }
        }
        None
    }

    fn try_sizes(
        &self,
        mut candidates: Vec<FabricSize>,
        limit_mm: usize,
    ) -> Option<Vec<CutResult>> {
        candidates.sort_by(|a, b| {
            self.is_priority(b)
                .cmp(&self.is_priority(a))
                .then(b.probability.total_cmp(&a.probability))
        });
        let slots = self.slots(&candidates);

        let parts: Vec<(f64, u32)> = slots.iter().map(|s| (s.size, s.min)).collect();
        let reach = Reachability::build(&parts, limit_mm, self.config.tolerance);
        if let Some(reach) = &reach
            && !reach.contains(0, self.total_length)
        {
            return None;
        }

        let mut counts = Vec::with_capacity(slots.len());
        let mut pruning = Pruning {
            capacity: Vec::new(),
            reach,
        };
        for bounds in [Bounds::Window, Bounds::Absolute] {
            pruning.capacity = suffix_capacity(&slots, bounds);
            if self.search(&slots, &pruning, bounds, 0, self.total_length, &mut counts) {
                return Some(
                    slots
                        .iter()
                        .zip(&counts)
                        .filter(|&(_, &pieces)| pieces > 0)
                        .map(|(slot, &pieces)| CutResult::new(slot.size, pieces))
                        .collect(),
                );
            }
            counts.clear();
        }
        None
    }

    /// Priority sizes in `candidates` are floored at one piece.
    fn slots(&self, candidates: &[FabricSize]) -> Vec<Slot> {
        let cfg = &self.config;
        let total = self.total_length;

        let priority_count = candidates.iter().filter(|s| self.is_priority(s)).count();
        let priority_mass: f64 = candidates
            .iter()
            .filter(|s| self.is_priority(s))
            .map(|s| s.probability)
            .sum();
        let estimated_pieces = total / cfg.average_piece_length;

        candidates
            .iter()
            .map(|s| {
                let absolute_max = pieces_that_fit(total, s.size);
                if self.is_priority(s) {
                    let share = if priority_mass > 0.0 {
                        s.probability / priority_mass
                    } else {
                        1.0 / priority_count as f64
                    };
                    let proportional = (share * estimated_pieces).round() as u32;
                    let preferred = proportional.max(1).min(absolute_max);
                    Slot {
                        size: s.size,
                        priority: true,
                        min: 1,
                        preferred,
                        window_max: absolute_max.min(preferred + cfg.priority_spread),
                        absolute_max,
                    }
                } else {
                    let estimated =
                        (total * s.probability * cfg.optional_demand_factor / s.size).ceil() as u32;
                    let mut window_max = absolute_max.min(estimated.max(1));
                    if s.size <= cfg.small_piece_length {
                        window_max = window_max.min(cfg.small_piece_cap);
                    }
                    Slot {
                        size: s.size,
                        priority: false,
                        min: 0,
                        preferred: 0,
                        window_max,
                        absolute_max,
                    }
                }
            })
            .collect()
    }

    /// Depth-first search over `slots[index..]`. On success `counts` holds one
    /// piece count per slot; on failure it is left as it was found.
    fn search(
        &self,
        slots: &[Slot],
        pruning: &Pruning,
        bounds: Bounds,
        index: usize,
        remaining: f64,
        counts: &mut Vec<u32>,
    ) -> bool {
        let tolerance = self.config.tolerance;
        let Some(slot) = slots.get(index) else {
            return remaining.abs() < tolerance;
        };

        // Even maxing out every slot left cannot use up the roll.
        if remaining - pruning.capacity[index] > tolerance {
            return false;
        }
        if let Some(reach) = &pruning.reach
            && !reach.contains(index, remaining)
        {
            return false;
        }

        let actual_max = slot
            .limit(bounds)
            .min(pieces_that_fit(remaining, slot.size));
        for pieces in try_order(slot, actual_max, self.config.priority_spread) {
            let next = remaining - slot.size * pieces as f64;
            if next < -tolerance {
                continue;
            }
            counts.push(pieces);
            if self.search(slots, pruning, bounds, index + 1, next, counts) {
                return true;
            }
            counts.pop();
        }
        false
    }

    /// Best-effort plan: fill each size towards its demand-proportional target,
    /// then top up greedily until nothing else fits.
    pub fn fallback(&self) -> CalculationResult {
        let mut sorted = self.sizes.clone();
        sorted.sort_by(|a, b| {
            self.is_priority(b)
                .cmp(&self.is_priority(a))
                .then(b.probability.total_cmp(&a.probability))
                .then(b.size.total_cmp(&a.size))
        });

        let estimated_pieces = (self.total_length / self.config.average_piece_length).floor();
        let mut remaining = self.total_length;
        let mut cuts: Vec<CutResult> = Vec::new();

        for s in &sorted {
            let floor = if self.is_priority(s) { 1 } else { 0 };
            let target = ((estimated_pieces * s.probability).round() as u32).max(floor);
            let pieces = pieces_that_fit(remaining, s.size).min(target);
            if pieces > 0 {
                cuts.push(CutResult::new(s.size, pieces));
                remaining -= s.size * pieces as f64;
            }
        }

        while let Some(s) = sorted
            .iter()
            .find(|s| pieces_that_fit(remaining, s.size) > 0)
        {
            match cuts.iter_mut().find(|c| c.size == s.size) {
                Some(cut) => cut.add_piece(),
                None => cuts.push(CutResult::new(s.size, 1)),
            }
            remaining -= s.size;
        }

        let cuts = merge_cuts(cuts);
        let used: f64 = cuts.iter().map(|c| c.total).sum();
        CalculationResult {
            cuts,
            leftover: round3(self.total_length - used),
            total_used: round3(used),
            fabric_width_cm: self.fabric_width_cm,
        }
    }
}

/// `capacity[i]` is the most length slots `i..` can absorb under `bounds`.
fn suffix_capacity(slots: &[Slot], bounds: Bounds) -> Vec<f64> {
    let mut capacity = vec![0.0; slots.len() + 1];
    for (i, slot) in slots.iter().enumerate().rev() {
        capacity[i] = capacity[i + 1] + slot.size * slot.limit(bounds) as f64;
    }
    capacity
}

/// Priority sizes start at their preferred count and spread outwards, then
/// sweep the rest from high to low. Optional sizes go up from zero.
fn try_order(slot: &Slot, actual_max: u32, spread: u32) -> Vec<u32> {
    if !slot.priority {
        return (0..=actual_max).collect();
    }

    let min = slot.min;
    let preferred = slot.preferred.min(actual_max);
    let mut order = Vec::new();
    if preferred >= min {
        order.push(preferred);
    }
    for offset in 1..=spread {
        if preferred + offset <= actual_max {
            order.push(preferred + offset);
        }
        if let Some(lower) = preferred.checked_sub(offset).filter(|&p| p >= min) {
            order.push(lower);
        }
    }
    for pieces in (min..=actual_max).rev() {
        if !order.contains(&pieces) {
            order.push(pieces);
        }
    }
    order
}

/// Drops empty cuts, sorts by size descending and folds equal sizes together.
fn merge_cuts(mut cuts: Vec<CutResult>) -> Vec<CutResult> {
    cuts.retain(|c| c.pieces > 0);
    cuts.sort_by(|a, b| b.size.total_cmp(&a.size));

    let mut merged: Vec<CutResult> = Vec::with_capacity(cuts.len());
    for cut in cuts {
        match merged.last_mut() {
            Some(last) if last.size == cut.size => {
                *last = CutResult::new(last.size, last.pieces + cut.pieces);
            }
            _ => merged.push(cut),
        }
    }
    merged
}
