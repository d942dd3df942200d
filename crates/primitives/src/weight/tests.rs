use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn pid(id: &str) -> ParticipantId {
	ParticipantId::new(id)
}

fn map(entries: &[(&str, u32)]) -> WeightMap {
	entries
		.iter()
		.map(|(id, w)| (pid(id), Weight::new(*w).unwrap()))
		.collect()
}

#[test]
fn test_toggle_inserts_with_weight_one_then_removes_key() {
	let mut weights = WeightMap::new();
	assert!(weights.toggle(&pid("a")));
	assert_eq!(weights.get(&pid("a")), Some(Weight::ONE));

	assert!(!weights.toggle(&pid("a")));
	assert!(!weights.contains(&pid("a")));
	assert!(weights.is_empty());
}

#[test]
fn test_adjust_floors_at_one() {
	let mut weights = map(&[("a", 3)]);
	assert_eq!(weights.adjust(&pid("a"), -10), Some(Weight::ONE));
	assert_eq!(weights.adjust(&pid("a"), 2).map(Weight::get), Some(3));
}

#[test]
fn test_adjust_ignores_unselected() {
	let mut weights = map(&[("a", 1)]);
	assert_eq!(weights.adjust(&pid("b"), 1), None);
	assert_eq!(weights, map(&[("a", 1)]));
}

#[test]
fn test_equality_ignores_insertion_order() {
	let mut forward = WeightMap::new();
	forward.insert(pid("a"), Weight::ONE);
	forward.insert(pid("b"), Weight::new(3).unwrap());

	let mut backward = WeightMap::new();
	backward.insert(pid("b"), Weight::new(3).unwrap());
	backward.insert(pid("a"), Weight::ONE);

	assert_eq!(forward, backward);
	assert_eq!(forward.key(), "a:1,b:3");
}

#[test]
fn test_equality_compares_values() {
	assert_ne!(map(&[("a", 1)]), map(&[("a", 2)]));
	assert_ne!(map(&[("a", 1)]), map(&[("a", 1), ("b", 1)]));
}

#[test]
fn test_external_weights_normalize_to_positive() {
	assert_eq!(Weight::from_external(None), Weight::ONE);
	assert_eq!(Weight::from_external(Some(0)), Weight::ONE);
	assert_eq!(Weight::from_external(Some(-4)), Weight::ONE);
	assert_eq!(Weight::from_external(Some(7)).get(), 7);
	assert_eq!(Weight::from_external(Some(i64::MAX)).get(), u32::MAX);
}

#[test]
fn test_retain_reports_removed_ids() {
	let mut weights = map(&[("a", 1), ("b", 2), ("c", 1)]);
	let removed = weights.retain(|id| id.as_str() != "b");
	assert_eq!(removed, vec![pid("b")]);
	assert_eq!(weights, map(&[("a", 1), ("c", 1)]));
}

proptest! {
	#[test]
	fn test_adjusted_weights_never_drop_below_one(deltas in proptest::collection::vec(-50i64..50, 0..64)) {
		let mut weights = map(&[("a", 1)]);
		for delta in deltas {
			let next = weights.adjust(&pid("a"), delta).unwrap();
			prop_assert!(next.get() >= 1);
		}
	}
}
