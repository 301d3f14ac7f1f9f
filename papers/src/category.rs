//! arXiv categories offered for discovery.

use serde::Serialize;

/// A selectable category. `code == None` is the "All Fields" wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Human-readable label.
    pub label: &'static str,

    /// arXiv category code, e.g. `cs.CV`.
    pub code: Option<&'static str>,
}

/// Categories shown to users, in display order.
pub const ARXIV_CATEGORIES: &[Category] = &[
    Category {
        label: "All Fields",
        code: None,
    },
    Category {
        label: "Computer Vision (cs.CV)",
        code: Some("cs.CV"),
    },
    Category {
        label: "Machine Learning (cs.LG)",
        code: Some("cs.LG"),
    },
    Category {
        label: "Artificial Intelligence (cs.AI)",
        code: Some("cs.AI"),
    },
    Category {
        label: "Computation and Language (cs.CL)",
        code: Some("cs.CL"),
    },
    Category {
        label: "Robotics (cs.RO)",
        code: Some("cs.RO"),
    },
    Category {
        label: "Neural and Evolutionary Computing (cs.NE)",
        code: Some("cs.NE"),
    },
    Category {
        label: "Statistical ML (stat.ML)",
        code: Some("stat.ML"),
    },
    Category {
        label: "Mathematics of ML (math.OC)",
        code: Some("math.OC"),
    },
];

/// Categories searched when no category is selected.
pub const DEFAULT_CATEGORIES: &[&str] = &["cs.CV", "cs.LG", "cs.CL", "cs.AI", "stat.ML"];

/// Look up a category by label or code, ignoring case. `"all"` selects
/// All Fields.
pub fn find_category(name: &str) -> Option<Category> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("all") {
        return ARXIV_CATEGORIES.first().copied();
    }
    ARXIV_CATEGORIES
        .iter()
        .find(|category| {
            category.label.eq_ignore_ascii_case(name)
                || category
                    .code
                    .is_some_and(|code| code.eq_ignore_ascii_case(name))
        })
        .copied()
}
