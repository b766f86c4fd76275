//! Discount row decoding

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rebate::{
    discounts::{DiscountKind, DiscountRecord, EligibilityMode, RuleRecord, targeting::AppliesTo},
    rules::RuleMetadata,
};
use serde_json::Value;
use sqlx::{FromRow, Row, postgres::PgRow};
use uuid::Uuid;

/// A discount as stored, without its rules.
pub(super) struct DiscountRow {
    pub(super) uuid: Uuid,
    pub(super) record: DiscountRecord,
}

impl<'r> FromRow<'r, PgRow> for DiscountRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let uuid: Uuid = row.try_get("uuid")?;

        let kind = parse_column(row, "kind", DiscountKind::parse)?;
        let applies_to = parse_column(row, "applies_to", AppliesTo::parse)?;
        let customer_eligibility =
            parse_column(row, "customer_eligibility", EligibilityMode::parse)?;

        let record = DiscountRecord {
            id: Some(uuid.to_string()),
            code: row.try_get("code")?,
            kind,
            value: row.try_get("value")?,
            is_active: row.try_get("is_active")?,
            starts_at: row
                .try_get::<Option<SqlxTimestamp>, _>("starts_at")?
                .map(SqlxTimestamp::to_jiff),
            expires_at: row
                .try_get::<Option<SqlxTimestamp>, _>("expires_at")?
                .map(SqlxTimestamp::to_jiff),
            usage_limit: try_get_count(row, "usage_limit")?,
            per_customer_limit: try_get_count(row, "per_customer_limit")?,
            current_usage: try_get_count(row, "current_usage")?.unwrap_or_default(),
            minimum_order: row.try_get("minimum_order")?,
            applies_to,
            included_ids: try_get_ids(row, "included_uuids")?,
            excluded_product_ids: try_get_ids(row, "excluded_product_uuids")?,
            customer_eligibility,
            allowed_customer_group_ids: try_get_ids(row, "allowed_customer_group_uuids")?,
            allowed_customer_ids: try_get_ids(row, "allowed_customer_uuids")?,
            first_order_only: row.try_get("first_order_only")?,
            promotion_type: row.try_get("promotion_type")?,
            target_config: row.try_get::<Option<Value>, _>("target_config")?,
            is_stackable: row.try_get("is_stackable")?,
            priority: row.try_get("priority")?,
            stop_further_rules: row.try_get("stop_further_rules")?,
            is_automatic: row.try_get("is_automatic")?,
            rules: Vec::new(),
        };

        Ok(Self { uuid, record })
    }
}

/// A promotion rule and the discount it belongs to.
pub(super) struct RuleRow {
    pub(super) discount_uuid: Uuid,
    pub(super) rule: RuleRecord,
}

impl<'r> FromRow<'r, PgRow> for RuleRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let metadata: Value = row.try_get("metadata")?;

        Ok(Self {
            discount_uuid: row.try_get("discount_uuid")?,
            rule: RuleRecord {
                rule_type: row.try_get("rule_type")?,
                operator: row.try_get("operator")?,
                value: row.try_get("value")?,
                metadata: serde_json::from_value::<RuleMetadata>(metadata).map_err(|e| {
                    sqlx::Error::ColumnDecode {
                        index: "metadata".to_string(),
                        source: Box::new(e),
                    }
                })?,
            },
        })
    }
}

fn parse_column<T>(row: &PgRow, col: &str, parse: impl Fn(&str) -> Option<T>) -> sqlx::Result<T> {
    let raw: String = row.try_get(col)?;

    parse(&raw).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: format!("unrecognized value {raw:?}").into(),
    })
}

fn try_get_count(row: &PgRow, col: &str) -> sqlx::Result<Option<u32>> {
    row.try_get::<Option<i32>, _>(col)?
        .map(u32::try_from)
        .transpose()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: col.to_string(),
            source: Box::new(e),
        })
}

fn try_get_ids(row: &PgRow, col: &str) -> sqlx::Result<Vec<String>> {
    Ok(row
        .try_get::<Vec<Uuid>, _>(col)?
        .iter()
        .map(Uuid::to_string)
        .collect())
}
