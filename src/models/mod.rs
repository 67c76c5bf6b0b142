use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder stored when a listing card lacks a field
pub const NOT_AVAILABLE: &str = "N/A";

/// Core property listing model, one row of the listings snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub property_id: Option<String>,
    pub title: String,
    pub location: String,
    pub price: String,
    pub size: String,
    pub details: String,
    pub date_posted: String,
    pub date_scraped: NaiveDate,
    pub date_updated: Option<NaiveDate>,
}

/// Listing attributes compared between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListingField {
    Title,
    Location,
    Price,
    Size,
    Details,
    DatePosted,
}

impl ListingField {
    pub const TRACKED: [ListingField; 6] = [
        ListingField::Title,
        ListingField::Location,
        ListingField::Price,
        ListingField::Size,
        ListingField::Details,
        ListingField::DatePosted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingField::Title => "title",
            ListingField::Location => "location",
            ListingField::Price => "price",
            ListingField::Size => "size",
            ListingField::Details => "details",
            ListingField::DatePosted => "date_posted",
        }
    }

    /// Read this attribute off a listing
    pub fn value<'a>(&self, property: &'a Property) -> &'a str {
        match self {
            ListingField::Title => &property.title,
            ListingField::Location => &property.location,
            ListingField::Price => &property.price,
            ListingField::Size => &property.size,
            ListingField::Details => &property.details,
            ListingField::DatePosted => &property.date_posted,
        }
    }
}

/// A single attribute that differs between the stored and scraped listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: ListingField,
    pub old: String,
    pub new: String,
}

/// All attribute changes detected for one listing in one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub property_id: String,
    pub date_updated: NaiveDate,
    pub changes: Vec<FieldChange>,
}

impl ChangeEntry {
    /// Look up the (old, new) pair for a field, if it changed
    pub fn change_for(&self, field: ListingField) -> Option<(&str, &str)> {
        self.changes
            .iter()
            .find(|c| c.field == field)
            .map(|c| (c.old.as_str(), c.new.as_str()))
    }
}

/// Promo codes split by lifecycle state, persisted as `{"new": [..], "used": [..]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeBook {
    pub new: Vec<String>,
    pub used: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codebook_requires_both_keys() {
        assert!(serde_json::from_str::<CodeBook>(r#"{"new": ["A"]}"#).is_err());
        let book: CodeBook = serde_json::from_str(r#"{"new": ["A"], "used": []}"#).unwrap();
        assert_eq!(book.new, vec!["A"]);
        assert!(book.used.is_empty());
    }

    #[test]
    fn test_field_value_lookup() {
        let property = Property {
            property_id: Some("P1".to_string()),
            title: "House".to_string(),
            location: "Harare".to_string(),
            price: "$100".to_string(),
            size: NOT_AVAILABLE.to_string(),
            details: "3 beds".to_string(),
            date_posted: "today".to_string(),
            date_scraped: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            date_updated: None,
        };
        assert_eq!(ListingField::Price.value(&property), "$100");
        assert_eq!(ListingField::Size.value(&property), "N/A");
        assert_eq!(ListingField::DatePosted.as_str(), "date_posted");
    }
}
