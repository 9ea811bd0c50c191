use std::collections::{BTreeMap, BTreeSet};

use super::header::HeaderValue;
use super::model::SpectralDataset;

// ---------------------------------------------------------------------------
// Filter predicate: which header values are selected per key
// ---------------------------------------------------------------------------

/// Per-key selection state: maps header key → set of selected values.
/// A key absent from the map does not constrain anything.
pub type FilterState = BTreeMap<String, BTreeSet<HeaderValue>>;

/// Initialise a [`FilterState`] with all values selected (i.e., show everything).
pub fn init_filter_state(dataset: &SpectralDataset) -> FilterState {
    dataset.unique_values.clone()
}

/// Return indices of spectra that pass all active filters.
///
/// A spectrum passes a key filter when:
/// * The key is not present in `filters` → passes (no constraint)
/// * Every known value of the key is selected → passes
/// * The filter set for that key is empty → nothing selected → fails
/// * The spectrum's header value for that key is in the selected set → passes
///
/// Spectra without the key fail any partial selection on it.
pub fn filtered_indices(dataset: &SpectralDataset, filters: &FilterState) -> Vec<usize> {
    dataset
        .spectra
        .iter()
        .enumerate()
        .filter(|(_, sp)| {
            filters.iter().all(|(key, selected)| {
                if selected.is_empty() {
                    return false;
                }
                let everything = dataset
                    .unique_values
                    .get(key)
                    .is_some_and(|all| selected.len() == all.len());
                everything || sp.header.get(key).is_some_and(|v| selected.contains(v))
            })
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::header::Header;
    use crate::data::model::Spectrum;

    fn dataset() -> SpectralDataset {
        let spectra = [("apple", 1_i64), ("apple", 2), ("pear", 1)]
            .iter()
            .map(|&(group, scan)| {
                let mut header = Header::new();
                header.insert("Group", group);
                header.insert("Scan", scan);
                Spectrum::new(vec![1.0].into(), vec![0.0].into(), header).unwrap()
            })
            .collect();
        SpectralDataset::from_spectra(spectra)
    }

    #[test]
    fn everything_selected_shows_all() {
        let ds = dataset();
        let filters = init_filter_state(&ds);
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 1, 2]);
    }

    #[test]
    fn partial_selection_combines_across_keys() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds);
        filters
            .get_mut("Group")
            .unwrap()
            .remove(&HeaderValue::from("pear"));
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 1]);

        filters
            .get_mut("Scan")
            .unwrap()
            .remove(&HeaderValue::Integer(1));
        assert_eq!(filtered_indices(&ds, &filters), vec![1]);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds);
        filters.insert("Group".into(), BTreeSet::new());
        assert!(filtered_indices(&ds, &filters).is_empty());
    }
}
