//! Projection of records into cards for display

use crate::models::{MeasurementField, MeasurementRecord, RecordId, NOT_AVAILABLE};

/// One labelled measurement line of a card's detail section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

/// A rendered record: summary, expandable details and its display position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Position in display order; the edit and delete actions take this index
    pub display_index: usize,
    pub id: RecordId,
    pub name: String,
    pub phone: String,
    pub timestamp: String,
    /// Every catalog field, in catalog order
    pub details: Vec<DetailRow>,
    pub comments: Option<String>,
    /// Cleared by the search filter when the card does not match
    pub visible: bool,
}

/// The full set of cards produced by one render pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedList {
    pub cards: Vec<Card>,
}

impl RenderedList {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards not hidden by the current filter
    pub fn visible(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|c| c.visible)
    }
}

/// Reorders records from storage order to display order (most recent first)
pub fn display_order(records: &[MeasurementRecord]) -> Vec<&MeasurementRecord> {
    records.iter().rev().collect()
}

/// Builds the detail rows for a record, `N/A` standing in for missing values
pub fn detail_rows(record: &MeasurementRecord) -> Vec<DetailRow> {
    MeasurementField::ALL
        .iter()
        .map(|&field| DetailRow {
            label: field.label(),
            value: record
                .measurements
                .get(field)
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
        })
        .collect()
}

/// Renders display-ordered records into a fresh list of cards
pub fn render(records: &[&MeasurementRecord]) -> RenderedList {
    let cards = records
        .iter()
        .enumerate()
        .map(|(display_index, record)| Card {
            display_index,
            id: record.id,
            name: record.name.clone(),
            phone: record.phone.clone(),
            timestamp: record.timestamp.clone(),
            details: detail_rows(record),
            comments: record.comments().map(str::to_string),
            visible: true,
        })
        .collect();
    RenderedList { cards }
}

/// One-line summary used by list views
pub fn format_summary_line(card: &Card) -> String {
    format!(
        "[{}] {} | {} | {}",
        card.display_index, card.name, card.phone, card.timestamp
    )
}

/// Multi-line text form of a card, details included
pub fn format_card(card: &Card) -> String {
    let mut output = String::new();
    output.push_str(&format!("Client: {}\n", card.name));
    output.push_str(&format!("Phone: {}\n", card.phone));
    output.push_str(&format!("Recorded: {}\n", card.timestamp));

    let width = card.details.iter().map(|r| r.label.len()).max().unwrap_or(0) + 1;
    for row in &card.details {
        output.push_str(&format!(
            "  {:<width$} {}\n",
            format!("{}:", row.label),
            row.value,
            width = width
        ));
    }

    if let Some(comments) = &card.comments {
        output.push_str(&format!("Comments: {}\n", comments));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> MeasurementRecord {
        MeasurementRecord::new(name.to_string(), "08012345678".to_string())
    }

    #[test]
    fn test_render_is_most_recent_first() {
        let records = vec![record("A"), record("B"), record("C")];
        let list = render(&display_order(&records));

        let names: Vec<_> = list.cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
        let indices: Vec<_> = list.cards.iter().map(|c| c.display_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(list.cards.iter().all(|c| c.visible));
    }

    #[test]
    fn test_render_is_idempotent() {
        let records = vec![record("A"), record("B")];
        let first = render(&display_order(&records));
        let second = render(&display_order(&records));
        assert_eq!(first, second);
    }

    #[test]
    fn test_details_cover_catalog_with_na() {
        let mut r = record("A");
        r.measurements
            .set(MeasurementField::Chest, Some("38".to_string()));
        let rows = detail_rows(&r);

        assert_eq!(rows.len(), 23);
        assert_eq!(rows[0].label, "Head");
        assert_eq!(rows[0].value, "N/A");
        assert_eq!(rows[3].label, "Chest");
        assert_eq!(rows[3].value, "38");
        assert_eq!(rows[22].label, "Inside Leg Seam");
    }

    #[test]
    fn test_comments_only_when_present() {
        let mut with = record("A");
        with.comments = Some("prefers slim fit".to_string());
        let mut blank = record("B");
        blank.comments = Some(String::new());

        let list = render(&[&with, &blank]);
        assert_eq!(list.cards[0].comments.as_deref(), Some("prefers slim fit"));
        assert_eq!(list.cards[1].comments, None);

        assert!(format_card(&list.cards[0]).contains("Comments: prefers slim fit"));
        assert!(!format_card(&list.cards[1]).contains("Comments"));
    }

    #[test]
    fn test_format_summary_line() {
        let r = record("Ada");
        let list = render(&[&r]);
        let line = format_summary_line(&list.cards[0]);
        assert!(line.starts_with("[0] Ada | 08012345678 | "));
    }
}
