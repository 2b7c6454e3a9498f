//! Category inference for records that arrive without a classification.
//!
//! Rules are data: an ordered list evaluated top to bottom, first match
//! wins, with an unconditional default at the end. Keywords are matched as
//! whole words against the lower-cased record name, parent label and
//! source label.

/// Category used when no rule matches.
pub const DEFAULT_CATEGORY: &str = "Other Products";
/// Subcategory used when nothing better is known.
pub const DEFAULT_SUBCATEGORY: &str = "Other";

/// One classification rule. An empty keyword list matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub keywords: &'static [&'static str],
    pub category: &'static str,
    pub subcategory: &'static str,
}

impl CategoryRule {
    fn matches(&self, words: &[String]) -> bool {
        self.keywords.is_empty() || self.keywords.iter().any(|k| words.iter().any(|w| w == k))
    }
}

/// The built-in rule table.
pub const DEFAULT_RULES: &[CategoryRule] = &[
    CategoryRule {
        keywords: &["pen", "pens", "ballpoint", "stylus", "rollerball"],
        category: "Metal Pens",
        subcategory: "Other",
    },
    CategoryRule {
        keywords: &[
            "kitchen", "cookware", "cooker", "kadai", "tawa", "pan", "pans", "knife", "knives",
            "chopper", "peeler",
        ],
        category: "Kitchen World",
        subcategory: "Other",
    },
    CategoryRule {
        keywords: &["crate", "crates"],
        category: "Industrial Plastic Crates",
        subcategory: "Other",
    },
    CategoryRule {
        keywords: &[
            "household", "dustbin", "dustbins", "bucket", "mug", "bottle", "bottles", "lunch",
            "container", "containers",
        ],
        category: "Household Products",
        subcategory: "Other",
    },
    CategoryRule {
        keywords: &[
            "hotel", "amenity", "amenities", "toiletries", "slippers", "soap", "soaps",
        ],
        category: "Hotel Amenities",
        subcategory: "Other",
    },
    CategoryRule {
        keywords: &[],
        category: DEFAULT_CATEGORY,
        subcategory: DEFAULT_SUBCATEGORY,
    },
];

/// Lower-cased alphanumeric words of every non-empty text.
fn words<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    texts
        .into_iter()
        .flat_map(|t| {
            t.split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_lowercase)
        })
        .collect()
}

/// Returns the first rule in `rules` matching any of `texts`, or the
/// built-in default rule when the table has no catch-all.
pub fn classify<'r, 't>(
    rules: &'r [CategoryRule],
    texts: impl IntoIterator<Item = &'t str>,
) -> &'r CategoryRule {
    let words = words(texts);
    rules
        .iter()
        .find(|rule| rule.matches(&words))
        .unwrap_or(&DEFAULT_RULES[DEFAULT_RULES.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pen_rule() {
        let rule = classify(DEFAULT_RULES, ["Astral Pen 3"]);
        assert_eq!(rule.category, "Metal Pens");
    }

    #[test]
    fn test_parent_label_is_considered() {
        let rule = classify(DEFAULT_RULES, ["Vertex 12", "Dyna Metal Pen Catalog"]);
        assert_eq!(rule.category, "Metal Pens");
    }

    #[test]
    fn test_kitchen_and_crate_rules() {
        assert_eq!(
            classify(DEFAULT_RULES, ["Non-stick Cookware Set"]).category,
            "Kitchen World"
        );
        assert_eq!(
            classify(DEFAULT_RULES, ["Vented Crate 600x400"]).category,
            "Industrial Plastic Crates"
        );
    }

    #[test]
    fn test_first_match_wins() {
        // Both "pen" and "kitchen" match; pens come first in the table.
        let rule = classify(DEFAULT_RULES, ["Kitchen marker pen"]);
        assert_eq!(rule.category, "Metal Pens");
    }

    #[test]
    fn test_whole_words_only() {
        let rule = classify(DEFAULT_RULES, ["Open top storage tub"]);
        assert_eq!(rule.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_default_rule() {
        let rule = classify(DEFAULT_RULES, ["Mystery item"]);
        assert_eq!(rule.category, "Other Products");
        assert_eq!(rule.subcategory, "Other");
    }

    #[test]
    fn test_table_without_catch_all_falls_back() {
        const ONLY_PENS: &[CategoryRule] = &[CategoryRule {
            keywords: &["pen"],
            category: "Metal Pens",
            subcategory: "Other",
        }];
        assert_eq!(classify(ONLY_PENS, ["Bucket"]).category, DEFAULT_CATEGORY);
    }
}
