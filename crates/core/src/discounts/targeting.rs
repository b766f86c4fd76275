//! Product targeting

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{CartLine, ProductId};

/// Which part of the catalogue a discount targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliesTo {
    /// Every product.
    #[default]
    All,

    /// Products listed in the included set.
    SpecificProducts,

    /// Products in a listed category.
    SpecificCategories,

    /// Products of a listed brand.
    SpecificBrands,
}

impl AppliesTo {
    /// Stored name of the targeting mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::SpecificProducts => "specific_products",
            Self::SpecificCategories => "specific_categories",
            Self::SpecificBrands => "specific_brands",
        }
    }

    /// Parse a stored targeting mode.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "all" => Some(Self::All),
            "specific_products" => Some(Self::SpecificProducts),
            "specific_categories" => Some(Self::SpecificCategories),
            "specific_brands" => Some(Self::SpecificBrands),
            _ => None,
        }
    }
}

/// Product targeting for a discount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targeting {
    /// Targeting mode.
    pub applies_to: AppliesTo,

    /// Included product, category or brand ids, depending on the mode.
    pub included: FxHashSet<Uuid>,

    /// Products that are never targeted.
    pub excluded_products: FxHashSet<ProductId>,
}

impl Targeting {
    /// Target every product.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Target a set of ids under the given mode.
    #[must_use]
    pub fn specific(applies_to: AppliesTo, included: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            applies_to,
            included: included.into_iter().collect(),
            excluded_products: FxHashSet::default(),
        }
    }

    /// Exclude products.
    #[must_use]
    pub fn excluding(mut self, products: impl IntoIterator<Item = ProductId>) -> Self {
        self.excluded_products.extend(products);
        self
    }

    /// Whether the discount applies to a set of cart lines.
    ///
    /// Always true when targeting every product. Otherwise at least one line
    /// must match the included set and no line may be an excluded product.
    pub fn applies_to(&self, lines: &[CartLine<'_>]) -> bool {
        if self.applies_to == AppliesTo::All {
            return true;
        }

        lines.iter().any(|line| self.includes(line))
            && !lines.iter().any(|line| self.excludes(line))
    }

    /// The lines a discount would act on: included and not excluded.
    pub fn targeted_lines<'a>(&self, lines: &[CartLine<'a>]) -> Vec<CartLine<'a>> {
        lines
            .iter()
            .filter(|line| self.includes(line) && !self.excludes(line))
            .cloned()
            .collect()
    }

    fn includes(&self, line: &CartLine<'_>) -> bool {
        match self.applies_to {
            AppliesTo::All => true,
            AppliesTo::SpecificProducts => self.included.contains(&line.product()),
            AppliesTo::SpecificCategories => line
                .categories()
                .iter()
                .any(|category| self.included.contains(category)),
            AppliesTo::SpecificBrands => line
                .brand()
                .is_some_and(|brand| self.included.contains(&brand)),
        }
    }

    fn excludes(&self, line: &CartLine<'_>) -> bool {
        self.excluded_products.contains(&line.product())
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::GBP};

    use crate::context::resolve_id;

    use super::*;

    fn line(product: &str) -> CartLine<'static> {
        CartLine::new(resolve_id(product), 1, Money::from_minor(100, GBP))
    }

    #[test]
    fn all_applies_to_any_set_including_empty() {
        let targeting = Targeting::all();

        assert!(targeting.applies_to(&[]));
        assert!(targeting.applies_to(&[line("a"), line("b")]));
    }

    #[test]
    fn specific_products_need_an_included_line() {
        let targeting = Targeting::specific(AppliesTo::SpecificProducts, [resolve_id("a")]);

        assert!(targeting.applies_to(&[line("a"), line("b")]));
        assert!(!targeting.applies_to(&[line("b")]));
        assert!(!targeting.applies_to(&[]));
    }

    #[test]
    fn excluded_products_block_the_whole_set() {
        let targeting = Targeting::specific(AppliesTo::SpecificProducts, [resolve_id("a")])
            .excluding([resolve_id("b")]);

        assert!(!targeting.applies_to(&[line("a"), line("b")]));
        assert_eq!(targeting.targeted_lines(&[line("a"), line("b")]), vec![line("a")]);
    }

    #[test]
    fn categories_and_brands_match_line_attributes() {
        let shoes = resolve_id("shoes");
        let acme = resolve_id("acme");

        let trainer = line("trainer")
            .with_categories([shoes])
            .with_brand(acme);

        assert!(Targeting::specific(AppliesTo::SpecificCategories, [shoes]).applies_to(&[trainer.clone()]));
        assert!(Targeting::specific(AppliesTo::SpecificBrands, [acme]).applies_to(&[trainer.clone()]));
        assert!(!Targeting::specific(AppliesTo::SpecificBrands, [shoes]).applies_to(&[trainer]));
    }

    #[test]
    fn targeting_mode_round_trips_through_names() {
        for mode in [
            AppliesTo::All,
            AppliesTo::SpecificProducts,
            AppliesTo::SpecificCategories,
            AppliesTo::SpecificBrands,
        ] {
            assert_eq!(AppliesTo::parse(mode.as_str()), Some(mode));
        }
    }
}
