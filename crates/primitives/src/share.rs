use crate::amount::Amount;
use crate::ids::ParticipantId;
use crate::weight::WeightMap;

/// Proportional share of `total` owed by `id`.
///
/// Returns 0 when `id` is not selected or the map carries no weight.
pub fn compute_share(weights: &WeightMap, id: &ParticipantId, total: Amount) -> f64 {
	let Some(weight) = weights.get(id) else {
		return 0.0;
	};
	let total_weight = weights.total_weight();
	if total_weight == 0 {
		return 0.0;
	}
	f64::from(weight.get()) / total_weight as f64 * total.to_f64()
}

/// Splits `total` into whole minor units per participant.
///
/// Floors each proportional part, then hands the leftover units to the
/// largest remainders (ties broken by participant id) so the parts sum
/// exactly to `total`.
pub fn allocate_minor_units(weights: &WeightMap, total: Amount) -> Vec<(ParticipantId, i64)> {
	let total_weight = i128::from(weights.total_weight());
	if total_weight == 0 {
		return Vec::new();
	}

	let sign: i128 = if total.minor_units() < 0 { -1 } else { 1 };
	let magnitude = i128::from(total.minor_units()).abs();

	let mut parts: Vec<(ParticipantId, i128, i128)> = weights
		.iter()
		.map(|(id, weight)| {
			let scaled = magnitude * i128::from(weight.get());
			(id.clone(), scaled / total_weight, scaled % total_weight)
		})
		.collect();

	let assigned: i128 = parts.iter().map(|(_, base, _)| base).sum();
	let mut leftover = magnitude - assigned;

	let mut order: Vec<usize> = (0..parts.len()).collect();
	order.sort_by(|&a, &b| parts[b].2.cmp(&parts[a].2).then_with(|| parts[a].0.cmp(&parts[b].0)));
	for idx in order {
		if leftover == 0 {
			break;
		}
		parts[idx].1 += 1;
		leftover -= 1;
	}

	parts
		.into_iter()
		.map(|(id, units, _)| (id, (units * sign) as i64))
		.collect()
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::weight::Weight;

	fn weights(entries: &[(&str, u32)]) -> WeightMap {
		entries
			.iter()
			.map(|(id, w)| (ParticipantId::new(id), Weight::new(*w).unwrap()))
			.collect()
	}

	#[test]
	fn test_shares_follow_weights() {
		let total = Amount::parse("100.00").unwrap().times(2).unwrap();
		let map = weights(&[("a", 1), ("b", 3)]);
		assert!((compute_share(&map, &ParticipantId::new("a"), total) - 50.0).abs() < 1e-9);
		assert!((compute_share(&map, &ParticipantId::new("b"), total) - 150.0).abs() < 1e-9);
	}

	#[test]
	fn test_absent_or_empty_share_is_zero() {
		let total = Amount::parse("10").unwrap();
		assert_eq!(compute_share(&weights(&[("a", 1)]), &ParticipantId::new("z"), total), 0.0);
		assert_eq!(compute_share(&WeightMap::new(), &ParticipantId::new("a"), total), 0.0);
	}

	#[test]
	fn test_allocation_hands_leftover_to_largest_remainder() {
		let total = Amount::parse("10.00").unwrap();
		let parts = allocate_minor_units(&weights(&[("a", 1), ("b", 1), ("c", 1)]), total);
		let units: Vec<i64> = parts.iter().map(|(_, u)| *u).collect();
		assert_eq!(units, vec![334, 333, 333]);
	}

	#[test]
	fn test_allocation_preserves_sign() {
		let total = Amount::parse("-1.00").unwrap();
		let parts = allocate_minor_units(&weights(&[("a", 1), ("b", 2)]), total);
		assert_eq!(parts.iter().map(|(_, u)| *u).sum::<i64>(), -100);
	}

	proptest! {
		#[test]
		fn test_shares_sum_to_total(
			raw in proptest::collection::vec(1u32..20, 1..8),
			minor in 0i64..10_000_000,
			quantity in 1u32..10,
		) {
			let map: WeightMap = raw
				.iter()
				.enumerate()
				.map(|(i, w)| (ParticipantId::new(format!("p{i}")), Weight::new(*w).unwrap()))
				.collect();
			let total = Amount::from_minor(minor, 2).times(quantity).unwrap();

			let sum: f64 = map.iter().map(|(id, _)| compute_share(&map, id, total)).sum();
			prop_assert!((sum - total.to_f64()).abs() < 1e-6 * total.to_f64().max(1.0));

			let exact: i64 = allocate_minor_units(&map, total).iter().map(|(_, u)| *u).sum();
			prop_assert_eq!(exact, total.minor_units());
		}
	}
}
