//! Unit registry and common-base resolution
//!
//! Registered units declare base relations to coarser-grained reference units
//! (`minute -> second`, `milligram -> gram`). A relation is exact when the
//! factor is fixed by definition and approximate for calendar months and
//! years. Names that are not registered produce ad-hoc units carrying only a
//! UCUM code.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// UCUM code of the dimensionless default unit
pub const DIMENSIONLESS: &str = "1";

/// UCUM code of the calendar reference unit
pub const SECOND: &str = "s";

/// Highest supported unit exponent
pub const MAX_EXPONENT: u8 = 3;

/// Conversion from a unit to one of its base units
#[derive(Debug, Clone, PartialEq)]
pub struct BaseRelation {
    /// UCUM code of the base unit
    pub target: &'static str,
    /// Calendar/physically fixed factor
    pub exact: bool,
    /// Number of base units in one unit
    pub factor: Decimal,
}

/// Unit definition
#[derive(Debug, Clone)]
pub struct UnitDefinition {
    singular: String,
    plural: String,
    ucum: String,
    bases: SmallVec<[BaseRelation; 2]>,
    registered: bool,
}

impl UnitDefinition {
    fn registered(singular: &str, plural: &str, ucum: &str) -> Self {
        Self {
            singular: singular.to_string(),
            plural: plural.to_string(),
            ucum: ucum.to_string(),
            bases: SmallVec::new(),
            registered: true,
        }
    }

    fn exact(mut self, target: &'static str, factor: Decimal) -> Self {
        self.bases.push(BaseRelation {
            target,
            exact: true,
            factor,
        });
        self
    }

    fn approximate(mut self, target: &'static str, factor: Decimal) -> Self {
        self.bases.push(BaseRelation {
            target,
            exact: false,
            factor,
        });
        self
    }

    /// Unit known only by its code
    pub fn ad_hoc(code: &str) -> Self {
        Self {
            singular: code.to_string(),
            plural: code.to_string(),
            ucum: code.to_string(),
            bases: SmallVec::new(),
            registered: false,
        }
    }

    pub fn singular(&self) -> &str {
        &self.singular
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn ucum(&self) -> &str {
        &self.ucum
    }

    pub fn bases(&self) -> &[BaseRelation] {
        &self.bases
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Relation to the base unit with the given code
    pub fn base(&self, target: &str) -> Option<&BaseRelation> {
        self.bases.iter().find(|b| b.target == target)
    }
}

static UNITS: Lazy<Vec<Arc<UnitDefinition>>> = Lazy::new(|| {
    let d = Decimal::new;
    vec![
        UnitDefinition::registered("1", "1", DIMENSIONLESS),
        // calendar durations
        UnitDefinition::registered("year", "years", "a")
            .exact("mo", d(12, 0))
            .approximate(SECOND, d(31_536_000, 0)),
        UnitDefinition::registered("month", "months", "mo").approximate(SECOND, d(2_592_000, 0)),
        UnitDefinition::registered("week", "weeks", "wk").exact(SECOND, d(604_800, 0)),
        UnitDefinition::registered("day", "days", "d").exact(SECOND, d(86_400, 0)),
        UnitDefinition::registered("hour", "hours", "h").exact(SECOND, d(3_600, 0)),
        UnitDefinition::registered("minute", "minutes", "min").exact(SECOND, d(60, 0)),
        UnitDefinition::registered("second", "seconds", SECOND),
        UnitDefinition::registered("millisecond", "milliseconds", "ms").exact(SECOND, d(1, 3)),
        UnitDefinition::registered("microsecond", "microseconds", "us").exact(SECOND, d(1, 6)),
        UnitDefinition::registered("nanosecond", "nanoseconds", "ns").exact(SECOND, d(1, 9)),
        // length
        UnitDefinition::registered("meter", "meters", "m"),
        UnitDefinition::registered("kilometer", "kilometers", "km").exact("m", d(1000, 0)),
        UnitDefinition::registered("centimeter", "centimeters", "cm").exact("m", d(1, 2)),
        UnitDefinition::registered("millimeter", "millimeters", "mm").exact("m", d(1, 3)),
        UnitDefinition::registered("inch", "inches", "[in_i]").exact("m", d(254, 4)),
        // mass
        UnitDefinition::registered("gram", "grams", "g"),
        UnitDefinition::registered("kilogram", "kilograms", "kg").exact("g", d(1000, 0)),
        UnitDefinition::registered("milligram", "milligrams", "mg").exact("g", d(1, 3)),
        UnitDefinition::registered("microgram", "micrograms", "ug").exact("g", d(1, 6)),
        // volume
        UnitDefinition::registered("liter", "liters", "L"),
        UnitDefinition::registered("milliliter", "milliliters", "mL").exact("L", d(1, 3)),
    ]
    .into_iter()
    .map(Arc::new)
    .collect()
});

/// Every singular, plural and UCUM name
static BY_NAME: Lazy<IndexMap<&'static str, Arc<UnitDefinition>>> = Lazy::new(|| {
    let mut map = IndexMap::new();
    for unit in UNITS.iter() {
        for name in [unit.ucum(), unit.singular(), unit.plural()] {
            map.entry(name).or_insert_with(|| unit.clone());
        }
    }
    map
});

/// Lower-cased singular and plural names; UCUM codes are case-sensitive
static BY_WORD: Lazy<IndexMap<String, Arc<UnitDefinition>>> = Lazy::new(|| {
    let mut map = IndexMap::new();
    for unit in UNITS.iter() {
        for name in [unit.singular(), unit.plural()] {
            map.entry(name.to_lowercase()).or_insert_with(|| unit.clone());
        }
    }
    map
});

fn lookup(name: &str) -> Option<Arc<UnitDefinition>> {
    BY_NAME
        .get(name)
        .or_else(|| BY_WORD.get(&name.to_lowercase()))
        .cloned()
}

/// Registered unit with the given UCUM code
pub fn registered_unit(code: &str) -> Option<Arc<UnitDefinition>> {
    BY_NAME.get(code).filter(|u| u.ucum() == code).cloned()
}

/// Unit with exponent (`cm3` is centimeter cubed)
#[derive(Debug, Clone)]
pub struct QuantityUnit {
    definition: Arc<UnitDefinition>,
    exp: u8,
}

/// Unit both operands can be expressed in
#[derive(Debug, Clone)]
pub struct CommonBase {
    /// The shared unit
    pub unit: QuantityUnit,
    /// Multiplier taking the left operand's magnitude into `unit`
    pub left_factor: Decimal,
    /// Multiplier taking the right operand's magnitude into `unit`
    pub right_factor: Decimal,
    /// Whether only exact relations were used
    pub exact: bool,
}

impl QuantityUnit {
    pub fn new(definition: Arc<UnitDefinition>, exp: u8) -> Self {
        Self { definition, exp }
    }

    /// Look up a unit name
    ///
    /// Names are matched exactly, then case-insensitively against singular and
    /// plural words. A trailing digit 1-3 is read as the exponent. Unknown
    /// names produce an ad-hoc unit.
    pub fn parse(name: &str) -> Self {
        if let Some(definition) = lookup(name) {
            return Self::new(definition, 1);
        }
        if let Some((base, exp)) = split_exponent(name) {
            if let Some(definition) = lookup(base) {
                return Self::new(definition, exp);
            }
        }
        log::debug!("unit '{}' is not registered, using ad-hoc unit", name);
        Self::new(Arc::new(UnitDefinition::ad_hoc(name)), 1)
    }

    /// Dimensionless default unit
    pub fn dimensionless() -> Self {
        Self::parse(DIMENSIONLESS)
    }

    pub fn definition(&self) -> &UnitDefinition {
        &self.definition
    }

    pub fn exp(&self) -> u8 {
        self.exp
    }

    /// Same unit raised to another exponent
    pub fn with_exp(&self, exp: u8) -> Self {
        Self::new(self.definition.clone(), exp)
    }

    /// UCUM code including the exponent
    pub fn code(&self) -> String {
        if self.exp == 1 {
            self.definition.ucum.clone()
        } else {
            format!("{}{}", self.definition.ucum, self.exp)
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        self.definition.ucum == DIMENSIONLESS
    }

    /// Identical unit and exponent
    pub fn same_unit(&self, other: &QuantityUnit) -> bool {
        self.exp == other.exp && self.definition.ucum == other.definition.ucum
    }

    /// Check for a registered unit usable in temporal arithmetic
    ///
    /// Accepts the second and every unit with a declared relation to it. That
    /// includes the approximate month and year relations, which calendar
    /// arithmetic resolves field by field instead of through the factor.
    pub fn is_calendar_duration_unit(&self) -> bool {
        self.exp == 1
            && self.definition.registered
            && (self.definition.ucum == SECOND || self.definition.base(SECOND).is_some())
    }

    /// Relation of this unit (exponent one) to the unit with code `target`
    fn factor_to(&self, target: &str, exact_only: bool) -> Option<(Decimal, bool)> {
        if self.definition.ucum == target {
            return Some((Decimal::ONE, true));
        }
        self.definition
            .base(target)
            .filter(|b| b.exact || !exact_only)
            .map(|b| (b.factor, b.exact))
    }

    /// Find the unit both operands convert to
    ///
    /// Candidates are `other` itself and its declared bases; the one with the
    /// lowest factor from `other` that `self` also reaches wins. With
    /// `exact_only`, approximate calendar relations are skipped.
    pub fn common_base(&self, other: &QuantityUnit, exact_only: bool) -> Option<CommonBase> {
        if self.exp != other.exp {
            return None;
        }

        let own = std::iter::once((other.definition.ucum.as_str(), Decimal::ONE, true));
        let declared = other
            .definition
            .bases
            .iter()
            .filter(|b| b.exact || !exact_only)
            .map(|b| (b.target, b.factor, b.exact));

        let (target, left, right, exact) = own
            .chain(declared)
            .filter_map(|(target, right, right_exact)| {
                self.factor_to(target, exact_only)
                    .map(|(left, left_exact)| (target, left, right, left_exact && right_exact))
            })
            .min_by(|a, b| a.2.cmp(&b.2))?;

        let definition = if target == other.definition.ucum {
            other.definition.clone()
        } else {
            registered_unit(target)?
        };
        log::trace!(
            "common base of '{}' and '{}' is '{}'",
            self.code(),
            other.code(),
            definition.ucum
        );

        Some(CommonBase {
            unit: Self::new(definition, self.exp),
            left_factor: pow(left, self.exp)?,
            right_factor: pow(right, self.exp)?,
            exact,
        })
    }

    /// Like [`QuantityUnit::common_base`], falling back to UCUM canonical
    /// factors when both units are ad-hoc
    ///
    /// UCUM conversions are never exact, so the fallback only applies when
    /// `exact_only` is false. A registered unit is never related to an ad-hoc
    /// one.
    pub fn convertible_base(&self, other: &QuantityUnit, exact_only: bool) -> Option<CommonBase> {
        self.common_base(other, exact_only).or_else(|| {
            let ad_hoc = !self.definition.registered && !other.definition.registered;
            if exact_only || !ad_hoc || self.exp != other.exp {
                None
            } else {
                ucum::common_base(self, other)
            }
        })
    }
}

#[cfg(feature = "ucum")]
mod ucum {
    use super::{CommonBase, QuantityUnit};
    use once_cell::sync::Lazy;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use rust_decimal::prelude::FromPrimitive;
    use std::collections::HashMap;

    static CANONICAL_FACTORS: Lazy<Mutex<HashMap<String, Option<f64>>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));

    fn canonical_factor(code: &str) -> Option<f64> {
        if let Some(cached) = CANONICAL_FACTORS.lock().get(code) {
            return *cached;
        }
        let factor = octofhir_ucum::get_canonical_units(code)
            .ok()
            .map(|canonical| canonical.factor);
        CANONICAL_FACTORS.lock().insert(code.to_string(), factor);
        factor
    }

    /// Express `other` in `unit`'s terms using UCUM canonical factors
    pub(super) fn common_base(unit: &QuantityUnit, other: &QuantityUnit) -> Option<CommonBase> {
        let (left, right) = (unit.code(), other.code());
        if !octofhir_ucum::is_comparable(&left, &right).unwrap_or(false) {
            return None;
        }
        let left_factor = canonical_factor(&left)?;
        let right_factor = canonical_factor(&right)?;
        if left_factor == 0.0 {
            return None;
        }
        let ratio = Decimal::from_f64(right_factor / left_factor)?;
        log::debug!("converting '{}' to '{}' through UCUM (factor {})", right, left, ratio);
        Some(CommonBase {
            unit: unit.clone(),
            left_factor: Decimal::ONE,
            right_factor: ratio,
            exact: false,
        })
    }
}

#[cfg(not(feature = "ucum"))]
mod ucum {
    use super::{CommonBase, QuantityUnit};

    pub(super) fn common_base(_unit: &QuantityUnit, _other: &QuantityUnit) -> Option<CommonBase> {
        None
    }
}

/// Split a trailing exponent digit 1-3 off a unit name
fn split_exponent(name: &str) -> Option<(&str, u8)> {
    let last = name.chars().last()?;
    let exp = last.to_digit(10)?;
    if !(1..=u32::from(MAX_EXPONENT)).contains(&exp) || name.len() < 2 {
        return None;
    }
    Some((&name[..name.len() - 1], exp as u8))
}

/// `value` raised to a small non-negative exponent
pub(crate) fn pow(value: Decimal, exp: u8) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..exp {
        result = result.checked_mul(value)?;
    }
    Some(result)
}

impl fmt::Display for QuantityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
