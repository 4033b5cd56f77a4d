/// Default number of entities that can be compared side by side.
pub const DEFAULT_COMPARE_CAPACITY: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
	#[error("compare list is full (capacity {capacity})")]
	Full { capacity: usize },
}

/// Ordered selection of entity ids with a hard cap.
///
/// Adding past the cap is rejected, never truncated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CompareList {
	capacity: usize,
	ids: Vec<String>,
}

impl Default for CompareList {
	fn default() -> Self {
		Self::with_capacity(DEFAULT_COMPARE_CAPACITY)
	}
}

impl CompareList {
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			capacity,
			ids: Vec::with_capacity(capacity),
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn is_full(&self) -> bool {
		self.ids.len() >= self.capacity
	}

	pub fn contains(&self, id: &str) -> bool {
		self.ids.iter().any(|v| v == id)
	}

	/// Returns `Ok(false)` when `id` was already selected.
	pub fn add(&mut self, id: impl Into<String>) -> Result<bool, CompareError> {
		let id = id.into();
		if self.contains(&id) {
			return Ok(false);
		}
		if self.is_full() {
			tracing::warn!(%id, capacity = self.capacity, "compare list full; not adding");
			return Err(CompareError::Full { capacity: self.capacity });
		}
		self.ids.push(id);
		Ok(true)
	}

	pub fn remove(&mut self, id: &str) -> bool {
		let before = self.ids.len();
		self.ids.retain(|v| v != id);
		self.ids.len() != before
	}

	pub fn clear(&mut self) {
		self.ids.clear();
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.ids.iter().map(String::as_str)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_past_capacity_without_truncating() {
		let mut list = CompareList::with_capacity(2);
		assert_eq!(list.add("a"), Ok(true));
		assert_eq!(list.add("b"), Ok(true));
		assert_eq!(list.add("c"), Err(CompareError::Full { capacity: 2 }));
		assert_eq!(list.iter().collect::<Vec<_>>(), ["a", "b"]);
	}

	#[test]
	fn re_adding_is_a_no_op_even_when_full() {
		let mut list = CompareList::with_capacity(1);
		assert_eq!(list.add("a"), Ok(true));
		assert_eq!(list.add("a"), Ok(false));
		assert_eq!(list.len(), 1);
	}

	#[test]
	fn removing_frees_a_slot() {
		let mut list = CompareList::default();
		for id in ["a", "b", "c"] {
			list.add(id).unwrap();
		}
		assert!(list.is_full());
		assert!(list.remove("b"));
		assert!(!list.contains("b"));
		assert_eq!(list.add("d"), Ok(true));
		assert_eq!(list.iter().collect::<Vec<_>>(), ["a", "c", "d"]);
		list.clear();
		assert!(list.is_empty());
	}
}
