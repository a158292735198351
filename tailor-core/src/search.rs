use crate::render::RenderedList;

/// Live filter over rendered cards, matching on the client name only
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    query: String,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replaces the query and filters `list` with it
    pub fn set_query(&mut self, query: &str, list: &mut RenderedList) -> Option<usize> {
        self.query = query.to_string();
        self.apply(list)
    }

    /// Shows cards whose name contains the query (case-insensitive), hides the
    /// rest, and returns the display index of the first match to scroll to.
    /// An empty query shows everything.
    pub fn apply(&self, list: &mut RenderedList) -> Option<usize> {
        let needle = self.query.to_lowercase();
        let mut first_match = None;

        for card in &mut list.cards {
            card.visible = card.name.to_lowercase().contains(&needle);
            if card.visible && first_match.is_none() {
                first_match = Some(card.display_index);
            }
        }

        first_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeasurementRecord;
    use crate::render::{display_order, render};

    fn list(names: &[&str]) -> RenderedList {
        let records: Vec<_> = names
            .iter()
            .map(|n| MeasurementRecord::new(n.to_string(), "08012345678".to_string()))
            .collect();
        render(&display_order(&records))
    }

    fn visible_names(list: &RenderedList) -> Vec<&str> {
        list.visible().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_empty_query_shows_all() {
        let mut cards = list(&["Ada", "Bola", "Chidi"]);
        let mut filter = SearchFilter::new();
        filter.set_query("zzz", &mut cards);

        assert_eq!(filter.set_query("", &mut cards), Some(0));
        assert_eq!(visible_names(&cards), vec!["Chidi", "Bola", "Ada"]);
    }

    #[test]
    fn test_no_match_hides_all() {
        let mut cards = list(&["Ada", "Bola"]);
        let mut filter = SearchFilter::new();
        assert_eq!(filter.set_query("xyz", &mut cards), None);
        assert!(visible_names(&cards).is_empty());
    }

    #[test]
    fn test_case_insensitive_substring() {
        let mut cards = list(&["Ada Obi", "Bola", "Chidi"]);
        let mut filter = SearchFilter::new();
        assert_eq!(filter.set_query("OBI", &mut cards), Some(2));
        assert_eq!(visible_names(&cards), vec!["Ada Obi"]);
    }

    #[test]
    fn test_does_not_search_other_fields() {
        let mut cards = list(&["Ada"]);
        let mut filter = SearchFilter::new();
        assert_eq!(filter.set_query("0801", &mut cards), None);
    }

    #[test]
    fn test_reapply_after_rerender() {
        let mut filter = SearchFilter::new();
        let mut cards = list(&["Ada", "Bola"]);
        filter.set_query("bo", &mut cards);

        let mut rerendered = list(&["Ada", "Bola", "Bode"]);
        assert_eq!(filter.apply(&mut rerendered), Some(0));
        assert_eq!(visible_names(&rerendered), vec!["Bode", "Bola"]);
    }
}
