//! Archive and category tables used for identifier validation and search links.

/// Archives that issued old-style `archive/YYMMNNN` identifiers.
const LEGACY_ARCHIVES: &[&str] = &[
    "acc-phys", "adap-org", "alg-geom", "ao-sci", "astro-ph", "atom-ph", "bayes-an", "chao-dyn",
    "chem-ph", "cmp-lg", "comp-gas", "cond-mat", "cs", "dg-ga", "funct-an", "gr-qc", "hep-ex",
    "hep-lat", "hep-ph", "hep-th", "math", "math-ph", "mtrl-th", "nlin", "nucl-ex", "nucl-th",
    "patt-sol", "physics", "plasm-ph", "q-alg", "q-bio", "quant-ph", "solv-int", "supr-con",
];

/// Archives that still accept submissions and have a search page.
const ACTIVE_ARCHIVES: &[&str] = &[
    "astro-ph", "cond-mat", "cs", "econ", "eess", "gr-qc", "hep-ex", "hep-lat", "hep-ph",
    "hep-th", "math", "math-ph", "nlin", "nucl-ex", "nucl-th", "physics", "q-bio", "q-fin",
    "quant-ph", "stat",
];

/// Retired subject classes folded into another archive.
const SUBSUMED_CATEGORIES: &[(&str, &str)] = &[
    ("acc-phys", "physics"),
    ("adap-org", "nlin"),
    ("alg-geom", "math"),
    ("ao-sci", "physics"),
    ("atom-ph", "physics"),
    ("bayes-an", "physics"),
    ("chao-dyn", "nlin"),
    ("chem-ph", "physics"),
    ("cmp-lg", "cs"),
    ("comp-gas", "nlin"),
    ("dg-ga", "math"),
    ("funct-an", "math"),
    ("mtrl-th", "cond-mat"),
    ("patt-sol", "nlin"),
    ("plasm-ph", "physics"),
    ("q-alg", "math"),
    ("solv-int", "nlin"),
    ("supr-con", "cond-mat"),
    ("math.MP", "math-ph"),
    ("stat.TH", "math"),
    ("cs.NA", "math"),
    ("eess.SY", "cs"),
    ("econ.GN", "q-fin"),
];

pub fn is_legacy_archive(archive: &str) -> bool {
    LEGACY_ARCHIVES.contains(&archive)
}

/// Archive a category belongs to, e.g. `cs.AI` -> `cs`, `hep-th` -> `hep-th`.
///
/// Returns `None` when the category names no archive this site knows about.
pub fn archive_for_category(category: &str) -> Option<&'static str> {
    if let Some((_, archive)) = SUBSUMED_CATEGORIES
        .iter()
        .find(|(subsumed, _)| *subsumed == category)
    {
        return Some(archive);
    }

    let prefix = category.split('.').next().unwrap_or(category);
    ACTIVE_ARCHIVES
        .iter()
        .find(|archive| **archive == prefix)
        .copied()
}
