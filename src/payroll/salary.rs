use rust_decimal::{prelude::FromPrimitive as _, Decimal};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::salary_configuration;

/// Name of the component a formula configuration derives basic from.
pub const BASIC_COMPONENT: &str = "basic";

#[derive(Debug, Error)]
pub enum SalaryError {
    #[error("basic salary is missing or not positive")]
    InvalidBasic,
    #[error("more than one component uses `remaining_amount`")]
    DuplicateRemaining,
    #[error("malformed salary components: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    PercentOfWage,
    PercentOfBasic,
    FixedAmount,
    RemainingAmount,
    /// Unrecognized kinds contribute zero instead of failing the payrun.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedComponent {
    pub name: String,
    pub kind: ComponentKind,
    /// Percentage (e.g. `40` for 40%) for the percent kinds, amount for
    /// `fixed_amount`, ignored for `remaining_amount`.
    #[serde(default)]
    pub value: Decimal,
}

/// The two supported configuration shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum SalaryConfig {
    /// Basic and allowances are already resolved monthly amounts.
    Static {
        basic: Decimal,
        allowances: Vec<(String, Decimal)>,
    },
    /// Components are derived from a target monthly wage.
    Formula {
        wage: Decimal,
        components: Vec<NamedComponent>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSalary {
    pub basic: Decimal,
    pub allowances: Vec<(String, Decimal)>,
    pub monthly_wage: Decimal,
}

impl SalaryConfig {
    /// Interprets a stored row. A row carrying both `wage` and `components`
    /// is formula-driven, anything else falls back to the static shape.
    pub fn from_model(model: &salary_configuration::Model) -> Result<Self, SalaryError> {
        if let (Some(wage), Some(components)) = (model.wage, &model.components) {
            let components = serde_json::from_value(components.clone())?;

            return Ok(SalaryConfig::Formula { wage, components });
        }

        let basic = model.basic.ok_or(SalaryError::InvalidBasic)?;

        let allowances = match &model.allowances {
            Some(serde_json::Value::Object(map)) => map
                .iter()
                // Numbers only, anything else counts as zero
                .map(|(name, value)| {
                    let amount = value.as_f64().and_then(Decimal::from_f64).unwrap_or_default();

                    (name.clone(), amount)
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(SalaryConfig::Static { basic, allowances })
    }
}

/// Rejects component lists that cannot be evaluated deterministically.
/// Checked when a configuration is saved and again before resolution.
pub fn validate_components(components: &[NamedComponent]) -> Result<(), SalaryError> {
    let remaining = components
        .iter()
        .filter(|c| c.kind == ComponentKind::RemainingAmount)
        .count();
    if remaining > 1 {
        return Err(SalaryError::DuplicateRemaining);
    }

    let basic_ok = components.iter().any(|c| {
        c.name == BASIC_COMPONENT
            && matches!(c.kind, ComponentKind::PercentOfWage | ComponentKind::FixedAmount)
    });
    if !basic_ok {
        return Err(SalaryError::InvalidBasic);
    }

    Ok(())
}

/// Resolves a configuration into per-component monthly amounts.
///
/// Evaluation order is load-bearing: basic first, then the named allowances
/// in their declared order, then the `remaining_amount` component, which
/// absorbs `wage - running_total` floored at zero.
pub fn resolve(config: &SalaryConfig) -> Result<ResolvedSalary, SalaryError> {
    let percent = dec!(100);

    let (basic, allowances) = match config {
        SalaryConfig::Static { basic, allowances } => (*basic, allowances.clone()),
        SalaryConfig::Formula { wage, components } => {
            validate_components(components)?;

            let basic_component = components
                .iter()
                .find(|c| c.name == BASIC_COMPONENT)
                .ok_or(SalaryError::InvalidBasic)?;

            let basic = match basic_component.kind {
                ComponentKind::PercentOfWage => wage * basic_component.value / percent,
                ComponentKind::FixedAmount => basic_component.value,
                _ => return Err(SalaryError::InvalidBasic),
            };

            let mut running_total = basic;
            let mut allowances = Vec::new();

            for component in components.iter().filter(|c| c.name != BASIC_COMPONENT) {
                let amount = match component.kind {
                    ComponentKind::PercentOfWage => wage * component.value / percent,
                    ComponentKind::PercentOfBasic => basic * component.value / percent,
                    ComponentKind::FixedAmount => component.value,
                    // Evaluated after every other component below
                    ComponentKind::RemainingAmount => continue,
                    ComponentKind::Unknown => Decimal::ZERO,
                };

                running_total += amount;
                allowances.push((component.name.clone(), amount));
            }

            if let Some(remaining) = components.iter().find(|c| c.kind == ComponentKind::RemainingAmount) {
                let amount = (wage - running_total).max(Decimal::ZERO);

                allowances.push((remaining.name.clone(), amount));
            }

            (basic, allowances)
        }
    };

    if basic <= Decimal::ZERO {
        return Err(SalaryError::InvalidBasic);
    }

    let monthly_wage = basic + allowances.iter().map(|(_, amount)| amount).sum::<Decimal>();

    Ok(ResolvedSalary { basic, allowances, monthly_wage })
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn formula(wage: Decimal, components: Vec<NamedComponent>) -> SalaryConfig {
        SalaryConfig::Formula { wage, components }
    }

    fn component(name: &str, kind: ComponentKind, value: Decimal) -> NamedComponent {
        NamedComponent { name: name.to_string(), kind, value }
    }

    #[test]
    fn test_static_resolution_is_identity() {
        let config = SalaryConfig::Static {
            basic: dec!(20000),
            allowances: vec![("hra".to_string(), dec!(8000)), ("transport".to_string(), dec!(2000))],
        };

        let resolved = resolve(&config).unwrap();

        assert_eq!(resolved.basic, dec!(20000));
        assert_eq!(resolved.monthly_wage, dec!(30000));
    }

    #[test]
    fn test_percent_of_basic_sees_final_basic() {
        let config = formula(dec!(50000), vec![
            component("basic", ComponentKind::PercentOfWage, dec!(40)),
            component("hra", ComponentKind::PercentOfBasic, dec!(50)),
        ]);

        let resolved = resolve(&config).unwrap();

        assert_eq!(resolved.basic, dec!(20000));
        assert_eq!(resolved.allowances, vec![("hra".to_string(), dec!(10000))]);
    }

    #[test]
    fn test_remaining_amount_absorbs_gap() {
        let config = formula(dec!(50000), vec![
            component("basic", ComponentKind::PercentOfWage, dec!(40)),
            component("hra", ComponentKind::PercentOfBasic, dec!(50)),
            component("special", ComponentKind::RemainingAmount, Decimal::ZERO),
        ]);

        let resolved = resolve(&config).unwrap();

        // 50000 - 20000 - 10000
        assert_eq!(resolved.allowances.last().unwrap(), &("special".to_string(), dec!(20000)));
        assert_eq!(resolved.monthly_wage, dec!(50000));
    }

    #[test]
    fn test_remaining_amount_never_negative() {
        let config = formula(dec!(10000), vec![
            component("basic", ComponentKind::FixedAmount, dec!(8000)),
            component("hra", ComponentKind::FixedAmount, dec!(5000)),
            component("special", ComponentKind::RemainingAmount, Decimal::ZERO),
        ]);

        let resolved = resolve(&config).unwrap();

        assert_eq!(resolved.allowances.last().unwrap(), &("special".to_string(), Decimal::ZERO));
    }

    #[test]
    fn test_unknown_kind_contributes_zero() {
        let components: Vec<NamedComponent> = serde_json::from_value(json!([
            { "name": "basic", "kind": "fixed_amount", "value": "15000" },
            { "name": "gadget", "kind": "percent_of_moon", "value": "10" },
        ]))
        .unwrap();

        let resolved = resolve(&formula(dec!(20000), components)).unwrap();

        assert_eq!(resolved.allowances, vec![("gadget".to_string(), Decimal::ZERO)]);
        assert_eq!(resolved.monthly_wage, dec!(15000));
    }

    #[test]
    fn test_non_positive_basic_is_rejected() {
        let config = SalaryConfig::Static { basic: Decimal::ZERO, allowances: Vec::new() };
        assert!(matches!(resolve(&config), Err(SalaryError::InvalidBasic)));

        let config = formula(dec!(10000), vec![
            component("basic", ComponentKind::FixedAmount, dec!(-1)),
        ]);
        assert!(matches!(resolve(&config), Err(SalaryError::InvalidBasic)));
    }

    #[test]
    fn test_duplicate_remaining_is_rejected() {
        let components = vec![
            component("basic", ComponentKind::FixedAmount, dec!(10000)),
            component("a", ComponentKind::RemainingAmount, Decimal::ZERO),
            component("b", ComponentKind::RemainingAmount, Decimal::ZERO),
        ];

        assert!(matches!(validate_components(&components), Err(SalaryError::DuplicateRemaining)));
    }

    #[test]
    fn test_static_allowances_ignore_non_numeric_values() {
        let model = salary_configuration::Model {
            id: uuid::Uuid::new_v4(),
            created_at: chrono::Local::now().into(),
            updated_at: chrono::Local::now().into(),
            employee_id: uuid::Uuid::new_v4(),
            basic: Some(dec!(12000)),
            allowances: Some(json!({ "hra": 3000, "note": "not a number" })),
            wage: None,
            components: None,
            created_by: None,
            updated_by: None,
        };

        let config = SalaryConfig::from_model(&model).unwrap();
        let resolved = resolve(&config).unwrap();

        assert_eq!(resolved.monthly_wage, dec!(15000));
        assert!(resolved.allowances.contains(&("note".to_string(), Decimal::ZERO)));
    }
}
