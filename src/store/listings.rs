use crate::models::{ChangeEntry, FieldChange, ListingField, Property};
use crate::store::write_atomic;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of reconciling a scrape with the stored snapshot
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Full snapshot to persist
    pub records: Vec<Property>,
    pub changes: Vec<ChangeEntry>,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Reconcile scraped listings with the stored snapshot.
///
/// Stored listings are the base, so ones missing from this scrape are kept.
/// A scraped listing with a known id replaces the stored one only when a
/// tracked field differs, and that difference is recorded. Listings without
/// an id can never be matched and are always appended. A listing that shows
/// up more than once in one scrape counts once, with its last copy.
pub fn merge(existing: Vec<Property>, scraped: Vec<Property>, today: NaiveDate) -> MergeOutcome {
    let mut outcome = MergeOutcome {
        records: existing,
        ..MergeOutcome::default()
    };

    let index: HashMap<String, usize> = outcome
        .records
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.property_id.clone().map(|id| (id, i)))
        .collect();

    for mut property in dedup_by_id(scraped) {
        let known = property.property_id.as_ref().and_then(|id| index.get(id)).copied();

        let Some(pos) = known else {
            outcome.records.push(property);
            outcome.inserted += 1;
            continue;
        };

        let stored = &outcome.records[pos];
        let changes = diff(stored, &property);
        if changes.is_empty() {
            outcome.unchanged += 1;
            continue;
        }

        let property_id = property.property_id.clone().unwrap_or_default();
        debug!("Listing {} changed: {} fields", property_id, changes.len());

        property.date_updated = Some(today);
        outcome.changes.push(ChangeEntry {
            property_id,
            date_updated: today,
            changes,
        });
        outcome.records[pos] = property;
        outcome.updated += 1;
    }

    outcome
}

/// Collapse repeated ids to the last copy seen, at the first copy's position
fn dedup_by_id(scraped: Vec<Property>) -> Vec<Property> {
    let mut unique: Vec<Property> = Vec::with_capacity(scraped.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for property in scraped {
        let Some(id) = property.property_id.clone() else {
            unique.push(property);
            continue;
        };
        match seen.get(&id) {
            Some(&pos) => unique[pos] = property,
            None => {
                seen.insert(id, unique.len());
                unique.push(property);
            }
        }
    }
    unique
}

fn diff(stored: &Property, scraped: &Property) -> Vec<FieldChange> {
    ListingField::TRACKED
        .iter()
        .filter(|field| field.value(stored) != field.value(scraped))
        .map(|&field| FieldChange {
            field,
            old: field.value(stored).to_string(),
            new: field.value(scraped).to_string(),
        })
        .collect()
}

/// The listings snapshot plus its append-only change log, both CSV
pub struct ListingStore {
    data_path: PathBuf,
    changes_path: PathBuf,
}

impl ListingStore {
    pub fn new(data_path: impl Into<PathBuf>, changes_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            changes_path: changes_path.into(),
        }
    }

    /// Read the stored snapshot; no file means no history yet
    pub fn load(&self) -> Result<Vec<Property>> {
        if !self.data_path.exists() {
            info!("No listings file at {}. Starting fresh.", self.data_path.display());
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.data_path)
            .with_context(|| format!("Failed to open {}", self.data_path.display()))?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<Property>, _>>()
            .with_context(|| format!("Failed to parse {}", self.data_path.display()))?;

        debug!("Loaded {} stored listings", records.len());
        Ok(records)
    }

    /// Replace the snapshot file
    pub fn save(&self, records: &[Property]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.serialize(record).context("Failed to serialize listing")?;
        }
        let bytes = writer.into_inner().context("Failed to flush listings")?;
        write_atomic(&self.data_path, &bytes)
    }

    /// Append change entries, writing the header only into a new or empty file
    pub fn append_changes(&self, changes: &[ChangeEntry]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let needs_header = fs::metadata(&self.changes_path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.changes_path)
            .with_context(|| format!("Failed to open {}", self.changes_path.display()))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer.write_record(change_log_header())?;
        }
        for entry in changes {
            writer.write_record(change_log_row(entry))?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Merge a scrape into the stored snapshot and persist both files.
    /// The change log is written first so a failed append leaves the old
    /// snapshot in place and the same changes are detected again next run.
    pub fn persist(&self, scraped: Vec<Property>, today: NaiveDate) -> Result<MergeOutcome> {
        let existing = self.load()?;
        let outcome = merge(existing, scraped, today);

        self.append_changes(&outcome.changes)?;
        self.save(&outcome.records)?;

        info!(
            "Listings: {} new, {} updated, {} unchanged, {} stored",
            outcome.inserted,
            outcome.updated,
            outcome.unchanged,
            outcome.records.len()
        );
        Ok(outcome)
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

fn change_log_header() -> Vec<String> {
    let mut header = vec!["property_id".to_string(), "date_updated".to_string()];
    for field in ListingField::TRACKED {
        header.push(format!("{}_old", field.as_str()));
        header.push(format!("{}_new", field.as_str()));
    }
    header
}

/// Unchanged fields leave their column pair empty
fn change_log_row(entry: &ChangeEntry) -> Vec<String> {
    let mut row = vec![entry.property_id.clone(), entry.date_updated.to_string()];
    for field in ListingField::TRACKED {
        let (old, new) = entry.change_for(field).unwrap_or(("", ""));
        row.push(old.to_string());
        row.push(new.to_string());
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOT_AVAILABLE;
    use crate::store::test_support::scratch_dir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn listing(id: &str, price: &str, scraped: NaiveDate) -> Property {
        Property {
            property_id: Some(id.to_string()),
            title: format!("House {id}"),
            location: "Harare".to_string(),
            price: price.to_string(),
            size: "500 m²".to_string(),
            details: "4 bedrooms".to_string(),
            date_posted: "1 June".to_string(),
            date_scraped: scraped,
            date_updated: None,
        }
    }

    fn store(name: &str) -> ListingStore {
        let dir = scratch_dir(name);
        ListingStore::new(dir.join("property_data.csv"), dir.join("property_data_changes.csv"))
    }

    #[test]
    fn test_price_change_is_recorded() {
        let existing = vec![listing("P1", "$100", day(1))];
        let scraped = vec![listing("P1", "$120", day(5))];

        let outcome = merge(existing, scraped, day(5));

        assert_eq!(outcome.records.len(), 1);
        let record = &outcome.records[0];
        assert_eq!(record.price, "$120");
        assert_eq!(record.date_scraped, day(5));
        assert_eq!(record.date_updated, Some(day(5)));

        assert_eq!(outcome.changes.len(), 1);
        let entry = &outcome.changes[0];
        assert_eq!(entry.property_id, "P1");
        assert_eq!(entry.date_updated, day(5));
        assert_eq!(entry.changes.len(), 1);
        assert_eq!(entry.change_for(ListingField::Price), Some(("$100", "$120")));
        assert_eq!(outcome.updated, 1);
    }

    #[test]
    fn test_unknown_listing_is_inserted_as_is() {
        let existing = vec![listing("P1", "$100", day(1))];
        let fresh = listing("P2", "$50", day(5));

        let outcome = merge(existing, vec![fresh.clone()], day(5));

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1], fresh);
        assert!(outcome.changes.is_empty());
        assert_eq!(outcome.inserted, 1);
    }

    #[test]
    fn test_identical_listing_keeps_stored_record() {
        let mut stored = listing("P1", "$100", day(1));
        stored.date_updated = Some(day(3));

        let outcome = merge(vec![stored.clone()], vec![listing("P1", "$100", day(5))], day(5));

        assert_eq!(outcome.records, vec![stored]);
        assert!(outcome.changes.is_empty());
        assert_eq!(outcome.unchanged, 1);
    }

    #[test]
    fn test_listings_missing_from_scrape_are_retained() {
        let existing = vec![listing("P1", "$100", day(1)), listing("P2", "$200", day(1))];

        let outcome = merge(existing.clone(), vec![listing("P2", "$250", day(5))], day(5));

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0], existing[0]);
        assert_eq!(outcome.records[1].price, "$250");
    }

    #[test]
    fn test_listings_without_id_are_always_appended() {
        let mut anonymous = listing("x", "$1", day(5));
        anonymous.property_id = None;

        let outcome = merge(vec![], vec![anonymous.clone(), anonymous.clone()], day(5));

        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.changes.is_empty());
        assert_eq!(outcome.inserted, 2);
    }

    #[test]
    fn test_new_listing_seen_twice_is_inserted_once() {
        let outcome = merge(
            vec![],
            vec![listing("P9", "$1", day(5)), listing("P9", "$2", day(5))],
            day(5),
        );

        assert_eq!(outcome.records, vec![listing("P9", "$2", day(5))]);
        assert!(outcome.changes.is_empty());
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.updated, 0);
    }

    #[test]
    fn test_known_listing_seen_twice_is_diffed_against_stored() {
        let outcome = merge(
            vec![listing("P1", "$100", day(1))],
            vec![listing("P1", "$110", day(5)), listing("P1", "$120", day(5))],
            day(5),
        );

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].price, "$120");
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(
            outcome.changes[0].change_for(ListingField::Price),
            Some(("$100", "$120"))
        );
        assert_eq!(outcome.updated, 1);
    }

    #[test]
    fn test_every_changed_field_is_paired() {
        let mut scraped = listing("P1", "$100", day(5));
        scraped.title = "Renamed".to_string();
        scraped.size = NOT_AVAILABLE.to_string();

        let outcome = merge(vec![listing("P1", "$100", day(1))], vec![scraped], day(5));

        let entry = &outcome.changes[0];
        let fields: Vec<_> = entry.changes.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec![ListingField::Title, ListingField::Size]);
        assert_eq!(entry.change_for(ListingField::Title), Some(("House P1", "Renamed")));
        assert_eq!(entry.change_for(ListingField::Size), Some(("500 m²", "N/A")));
        assert_eq!(entry.change_for(ListingField::Price), None);
    }

    #[test]
    fn test_snapshot_survives_save_and_load() {
        let store = store("listings-roundtrip");
        let mut updated = listing("P1", "$100, negotiable", day(1));
        updated.date_updated = Some(day(2));
        let mut anonymous = listing("x", "$5", day(1));
        anonymous.property_id = None;
        let records = vec![updated, anonymous];

        store.save(&records).unwrap();

        assert_eq!(store.load().unwrap(), records);
    }

    #[test]
    fn test_missing_snapshot_loads_empty() {
        assert!(store("listings-empty").load().unwrap().is_empty());
    }

    #[test]
    fn test_persist_appends_change_log_across_runs() {
        let store = store("listings-persist");

        store.persist(vec![listing("P1", "$100", day(1))], day(1)).unwrap();
        assert!(!store.changes_path.exists());

        store.persist(vec![listing("P1", "$120", day(2))], day(2)).unwrap();
        store
            .persist(vec![listing("P1", "$150", day(3)), listing("P2", "$9", day(3))], day(3))
            .unwrap();

        let stored = store.load().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].price, "$150");
        assert_eq!(stored[0].date_updated, Some(day(3)));

        let mut reader = csv::Reader::from_path(&store.changes_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "property_id");
        assert_eq!(&headers[6], "price_old");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "P1");
        assert_eq!(&rows[0][1], "2024-06-02");
        assert_eq!((&rows[0][6], &rows[0][7]), ("$100", "$120"));
        assert_eq!((&rows[1][6], &rows[1][7]), ("$120", "$150"));
        assert_eq!(&rows[1][2], "");
    }

    #[test]
    fn test_failed_change_log_keeps_old_snapshot() {
        let store = store("listings-log-fails");
        store.persist(vec![listing("P1", "$100", day(1))], day(1)).unwrap();
        fs::create_dir_all(&store.changes_path).unwrap();

        assert!(store.persist(vec![listing("P1", "$120", day(2))], day(2)).is_err());

        let stored = store.load().unwrap();
        assert_eq!(stored[0].price, "$100");
        assert_eq!(stored[0].date_updated, None);
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let store = store("listings-bad");
        fs::write(&store.data_path, "property_id,title\nP1,House\n").unwrap();

        assert!(store.load().is_err());
    }
}
