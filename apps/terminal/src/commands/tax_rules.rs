//! # Tax Rule Commands
//!
//! Named tax rates. At most one rule is the default; a new cart starts
//! with it. The till enters rates as percentages (`15` for 15%).

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use kaya_core::validation::{validate_tax_percent, validate_tax_rule_name};
use kaya_core::{LocalId, NewTaxRule, TaxRate, TaxRule};
use kaya_db::Database;

use crate::error::ApiResult;

/// Tax rule form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRuleRequest {
    pub name: String,
    /// Percentage, 0 to 100
    pub percent: Decimal,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl TaxRuleRequest {
    fn into_rule(self) -> ApiResult<NewTaxRule> {
        validate_tax_rule_name(&self.name)?;
        validate_tax_percent(self.percent)?;

        Ok(NewTaxRule {
            name: self.name.trim().to_string(),
            rate: TaxRate::from_percent(self.percent)?,
            is_default: self.is_default,
            is_active: self.is_active,
        })
    }
}

/// Rules, default first.
pub async fn list_tax_rules(db: &Database) -> ApiResult<Vec<TaxRule>> {
    debug!("list_tax_rules command");
    Ok(db.tax_rules().list().await?)
}

pub async fn create_tax_rule(db: &Database, request: TaxRuleRequest) -> ApiResult<TaxRule> {
    debug!(name = %request.name, percent = %request.percent, "create_tax_rule command");

    let rule = db.tax_rules().insert(&request.into_rule()?).await?;
    info!(id = %rule.id, name = %rule.name, rate = %rule.rate.percent(), "Tax rule created");
    Ok(rule)
}

pub async fn update_tax_rule(
    db: &Database,
    id: LocalId,
    request: TaxRuleRequest,
) -> ApiResult<TaxRule> {
    debug!(id = %id, "update_tax_rule command");
    Ok(db.tax_rules().update(id, &request.into_rule()?).await?)
}

/// Makes `id` the only default rule.
pub async fn set_default_tax_rule(db: &Database, id: LocalId) -> ApiResult<Vec<TaxRule>> {
    debug!(id = %id, "set_default_tax_rule command");
    db.tax_rules().set_default(id).await?;
    list_tax_rules(db).await
}

pub async fn delete_tax_rule(db: &Database, id: LocalId) -> ApiResult<()> {
    debug!(id = %id, "delete_tax_rule command");
    Ok(db.tax_rules().delete(id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::tests::test_state;

    fn nhil(percent: i64) -> TaxRuleRequest {
        TaxRuleRequest {
            name: "NHIL".into(),
            percent: Decimal::from(percent),
            is_default: false,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_promote_default() {
        let state = test_state().await;

        let rule = create_tax_rule(&state.db, nhil(5)).await.unwrap();
        assert_eq!(rule.rate.percent(), Decimal::from(5));
        assert!(!rule.is_default);

        let rules = set_default_tax_rule(&state.db, rule.id).await.unwrap();
        let defaults: Vec<&str> = rules
            .iter()
            .filter(|r| r.is_default)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(defaults, vec!["NHIL"]);
    }

    #[tokio::test]
    async fn test_percent_out_of_range() {
        let state = test_state().await;

        let err = create_tax_rule(&state.db, nhil(150)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_tax_rule(&state.db, nhil(-1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert_eq!(list_tax_rules(&state.db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let state = test_state().await;
        let rule = create_tax_rule(&state.db, nhil(5)).await.unwrap();

        let updated = update_tax_rule(
            &state.db,
            rule.id,
            TaxRuleRequest {
                percent: Decimal::new(25, 1),
                ..nhil(0)
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.rate.fraction(), Decimal::new(25, 3));

        delete_tax_rule(&state.db, rule.id).await.unwrap();
        let err = delete_tax_rule(&state.db, rule.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
