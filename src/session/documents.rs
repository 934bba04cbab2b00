// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Source document filtering before display

use crate::session::Document;
use std::collections::HashSet;

// Documents whose source URL contains this marker are navigation artifacts
// of the upstream CMS, not real articles
const EXCLUDED_SOURCE_MARKER: &str = "?post_type=";

/// Filter the documents attached to a bot reply before they are shown.
///
/// Drops every document whose source URL contains `?post_type=`, then keeps
/// only the first occurrence of each distinct source URL. Relative order of
/// the surviving documents is preserved.
pub fn filter_documents(documents: Vec<Document>) -> Vec<Document> {
	let mut seen: HashSet<String> = HashSet::new();

	documents
		.into_iter()
		.filter(|doc| !doc.source.contains(EXCLUDED_SOURCE_MARKER))
		.filter(|doc| seen.insert(doc.source.clone()))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn doc(id: &str, source: &str) -> Document {
		Document {
			id: id.to_string(),
			source: source.to_string(),
			title: format!("Title {}", id),
			content: String::new(),
			tags: Vec::new(),
		}
	}

	#[test]
	fn test_first_occurrence_wins_and_order_is_stable() {
		let input = vec![
			doc("1", "http://example.com/a"),
			doc("2", "http://example.com/b"),
			doc("3", "http://example.com/a"),
		];

		let filtered = filter_documents(input);

		assert_eq!(filtered.len(), 2);
		assert_eq!(filtered[0].source, "http://example.com/a");
		assert_eq!(filtered[0].id, "1"); // first occurrence, not the later duplicate
		assert_eq!(filtered[1].source, "http://example.com/b");
	}

	#[test]
	fn test_duplicate_sources_with_different_metadata_are_dropped() {
		let mut first = doc("1", "http://example.com/a");
		first.tags = vec!["guide".to_string()];
		let mut second = doc("2", "http://example.com/a");
		second.title = "A completely different title".to_string();
		second.tags = vec!["faq".to_string()];

		let filtered = filter_documents(vec![first, second]);

		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].id, "1");
	}

	#[test]
	fn test_post_type_sources_are_excluded_even_when_unique() {
		let input = vec![doc("1", "http://x/?post_type=page")];

		let filtered = filter_documents(input);

		assert!(filtered.is_empty());
	}

	#[test]
	fn test_post_type_exclusion_runs_before_dedup() {
		// The excluded document must not claim the "first occurrence" slot
		let input = vec![
			doc("1", "http://x/?post_type=page"),
			doc("2", "http://example.com/a"),
			doc("3", "http://x/?post_type=page"),
		];

		let filtered = filter_documents(input);

		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].id, "2");
	}

	#[test]
	fn test_empty_input_yields_empty_output() {
		assert!(filter_documents(Vec::new()).is_empty());
	}

	#[test]
	fn test_filter_is_idempotent() {
		let input = vec![
			doc("1", "http://example.com/a"),
			doc("2", "http://example.com/b"),
			doc("3", "http://example.com/a"),
			doc("4", "http://x/?post_type=faq"),
		];

		let once = filter_documents(input);
		let twice = filter_documents(once.clone());

		assert_eq!(once, twice);
	}
}
