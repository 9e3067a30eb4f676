use std::cmp::{Ordering, Reverse};

use ordered_float::OrderedFloat;

use crate::core::catalog::Catalog;
use crate::core::timeseries::SeriesKey;

/// Sorts selection keys into display order.
///
/// Observatories with a known latitude come first, north to south; the rest
/// follow. Ties fall back to observatory id, then to the element's position
/// in `element_order` (unknown elements last).
pub fn sort_series_keys(keys: &mut [SeriesKey], catalog: &Catalog, element_order: &[String]) {
    keys.sort_by(|a, b| compare_series_keys(a, b, catalog, element_order));
}

#[must_use]
pub fn compare_series_keys(
    a: &SeriesKey,
    b: &SeriesKey,
    catalog: &Catalog,
    element_order: &[String],
) -> Ordering {
    latitude_rank(a, catalog)
        .cmp(&latitude_rank(b, catalog))
        .then_with(|| a.observatory.cmp(&b.observatory))
        .then_with(|| element_rank(a, element_order).cmp(&element_rank(b, element_order)))
        .then_with(|| a.element.cmp(&b.element))
}

// `None` latitude sorts after every known latitude.
fn latitude_rank(key: &SeriesKey, catalog: &Catalog) -> (bool, Reverse<OrderedFloat<f64>>) {
    let latitude = catalog
        .observatory(&key.observatory)
        .and_then(|observatory| observatory.latitude)
        .filter(|latitude| latitude.is_finite());
    (
        latitude.is_none(),
        Reverse(OrderedFloat(latitude.unwrap_or(0.0))),
    )
}

fn element_rank(key: &SeriesKey, element_order: &[String]) -> usize {
    element_order
        .iter()
        .position(|element| *element == key.element)
        .unwrap_or(usize::MAX)
}
