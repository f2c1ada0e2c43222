//! Scale, additional cost and factor operations for the repository.

use crate::domain::{
    AdditionalCosts, FactorKey, FactorSheet, FactorTable, RangeScale, ScaleSet, ScalesPayload,
};
use sqlx::{Row, Sqlite, Transaction};
use std::collections::BTreeMap;
use tracing::info;

use super::{parse_stored_decimal, Repository};

const INSTALLATION: &str = "installation";
const GROSS_PROFIT: &str = "gross_profit";
const FINANCE_FEE: &str = "finance_fee";

impl Repository {
    /// Load the three sliding scales and the additional costs in wire form.
    ///
    /// Additional costs take their defaults when none are stored.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub async fn load_scales(&self) -> Result<ScalesPayload, sqlx::Error> {
        let rows = sqlx::query("SELECT scale, label, rate FROM scale_bands ORDER BY scale, position")
            .fetch_all(&self.pool)
            .await?;

        let mut payload = ScalesPayload::default();
        for row in rows {
            let scale: String = row.get("scale");
            let label: String = row.get("label");
            let rate: String = row.get("rate");
            let target = match scale.as_str() {
                INSTALLATION => &mut payload.installation,
                GROSS_PROFIT => &mut payload.gross_profit,
                FINANCE_FEE => &mut payload.finance_fee,
                _ => continue,
            };
            target.insert(label, parse_stored_decimal(&rate, "scale_bands.rate"));
        }

        payload.additional_costs = Some(self.load_additional_costs().await?);
        Ok(payload)
    }

    /// Stored per-unit costs, or the defaults when none are stored.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn load_additional_costs(&self) -> Result<AdditionalCosts, sqlx::Error> {
        let row = sqlx::query(
            "SELECT cost_per_kilometer, cost_per_point FROM additional_costs WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => {
                let per_km: String = row.get("cost_per_kilometer");
                let per_point: String = row.get("cost_per_point");
                AdditionalCosts {
                    cost_per_kilometer: parse_stored_decimal(&per_km, "cost_per_kilometer"),
                    cost_per_point: parse_stored_decimal(&per_point, "cost_per_point"),
                }
            }
            None => AdditionalCosts::default(),
        })
    }

    /// Replace all three scales and the additional costs in a single transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn replace_scales(&self, scales: &ScaleSet) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM scale_bands").execute(&mut *tx).await?;
        insert_scale(&mut tx, INSTALLATION, &scales.installation).await?;
        insert_scale(&mut tx, GROSS_PROFIT, &scales.gross_profit).await?;
        insert_scale(&mut tx, FINANCE_FEE, &scales.finance_fee).await?;

        sqlx::query(
            r#"
            INSERT INTO additional_costs (id, cost_per_kilometer, cost_per_point, updated_at)
            VALUES (1, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                cost_per_kilometer = excluded.cost_per_kilometer,
                cost_per_point = excluded.cost_per_point,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(scales.additional_costs.cost_per_kilometer.to_canonical_string())
        .bind(scales.additional_costs.cost_per_point.to_canonical_string())
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            installation = scales.installation.len(),
            gross_profit = scales.gross_profit.len(),
            finance_fee = scales.finance_fee.len(),
            "Replaced sliding scales"
        );
        Ok(())
    }

    /// Load the factor sheet in wire form.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn load_factors(&self) -> Result<FactorSheet, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT term_months, escalation, label, factor
            FROM factor_bands
            ORDER BY term_months, escalation, position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut sheet = FactorSheet::new();
        for row in rows {
            let term_months: i64 = row.get("term_months");
            let escalation: String = row.get("escalation");
            let label: String = row.get("label");
            let factor: String = row.get("factor");

            let key = FactorKey::new(
                u32::try_from(term_months).unwrap_or(0),
                parse_stored_decimal(&escalation, "factor_bands.escalation"),
            );
            sheet
                .entry(key.wire_term())
                .or_insert_with(BTreeMap::new)
                .entry(key.wire_escalation())
                .or_insert_with(BTreeMap::new)
                .insert(label, parse_stored_decimal(&factor, "factor_bands.factor"));
        }

        Ok(sheet)
    }

    /// Replace the factor sheet in a single transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn replace_factors(&self, factors: &FactorTable) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM factor_bands").execute(&mut *tx).await?;
        for (key, scale) in factors.iter() {
            for (position, band) in scale.bands().iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO factor_bands (term_months, escalation, position, label, factor)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(i64::from(key.term_months()))
                .bind(key.escalation().to_canonical_string())
                .bind(position as i64)
                .bind(&band.label)
                .bind(band.rate.to_canonical_string())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        info!(keys = factors.len(), "Replaced factor sheet");
        Ok(())
    }
}

async fn insert_scale(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    scale: &RangeScale,
) -> Result<(), sqlx::Error> {
    for (position, band) in scale.bands().iter().enumerate() {
        sqlx::query("INSERT INTO scale_bands (scale, position, label, rate) VALUES (?, ?, ?, ?)")
            .bind(name)
            .bind(position as i64)
            .bind(&band.label)
            .bind(band.rate.to_canonical_string())
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
