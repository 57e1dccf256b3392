//! Set comparison between manifest-declared and extracted classes.

use crate::models::ComparisonResult;
use std::collections::BTreeSet;

/// Compare one package. Inputs are only read.
///
/// `missing = defined - extracted`, `new = extracted - defined`,
/// `common = extracted ∩ defined`, and `critical_missing = missing ∩ critical`.
pub fn compare(
    extracted: &BTreeSet<String>,
    defined: &BTreeSet<String>,
    critical: &BTreeSet<String>,
) -> ComparisonResult {
    let missing: BTreeSet<String> = defined.difference(extracted).cloned().collect();
    let new = extracted.difference(defined).cloned().collect();
    let common = extracted.intersection(defined).cloned().collect();
    let critical_missing = missing.intersection(critical).cloned().collect();
    ComparisonResult {
        extracted: extracted.clone(),
        defined: defined.clone(),
        missing,
        new,
        common,
        critical_missing,
    }
}
