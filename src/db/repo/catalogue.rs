//! Section and line item operations for the repository.

use crate::domain::{LineItem, Section, SectionId};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

use super::{parse_stored_decimal, Repository};

impl Repository {
    /// Load the catalogue in stored order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn load_sections(&self) -> Result<Vec<Section>, sqlx::Error> {
        let section_rows = sqlx::query("SELECT id, name FROM sections ORDER BY position")
            .fetch_all(&self.pool)
            .await?;

        let mut sections = Vec::with_capacity(section_rows.len());
        for row in section_rows {
            let id: String = row.get("id");
            let Ok(section_id) = SectionId::from_str(&id) else {
                warn!(section = %id, "Skipping unknown section in pricing store");
                continue;
            };

            let item_rows = sqlx::query(
                r#"
                SELECT id, name, cost, quantity, locked
                FROM line_items
                WHERE section_id = ?
                ORDER BY position
                "#,
            )
            .bind(&id)
            .fetch_all(&self.pool)
            .await?;

            let items = item_rows
                .into_iter()
                .map(|item| {
                    let cost: String = item.get("cost");
                    let quantity: i64 = item.get("quantity");
                    LineItem {
                        id: item.get("id"),
                        name: item.get("name"),
                        unit_cost: parse_stored_decimal(&cost, "line_items.cost"),
                        quantity: u32::try_from(quantity).unwrap_or(0),
                        locked: item.get::<i64, _>("locked") != 0,
                    }
                })
                .collect();

            sections.push(Section {
                id: section_id,
                name: row.get("name"),
                items,
            });
        }

        Ok(sections)
    }

    /// Replace the whole catalogue in a single transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn replace_sections(&self, sections: &[Section]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM line_items").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM sections").execute(&mut *tx).await?;

        for (position, section) in sections.iter().enumerate() {
            sqlx::query("INSERT INTO sections (id, name, position) VALUES (?, ?, ?)")
                .bind(section.id.as_str())
                .bind(&section.name)
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;

            for (item_position, item) in section.items.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO line_items (section_id, id, name, cost, quantity, locked, position)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(section.id.as_str())
                .bind(&item.id)
                .bind(&item.name)
                .bind(item.unit_cost.to_canonical_string())
                .bind(i64::from(item.quantity))
                .bind(item.locked)
                .bind(item_position as i64)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{init_db, Repository};
    use crate::domain::{Decimal, LineItem, Section, SectionId};
    use tempfile::TempDir;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[tokio::test]
    async fn test_replace_and_load_sections_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db").to_string_lossy().to_string();
        let repo = Repository::new(init_db(&db_path).await.unwrap());

        let sections = vec![
            Section::new(
                SectionId::Licensing,
                vec![
                    LineItem::new("premium-license", "Premium License", d("89")),
                    LineItem::new("basic-license", "Basic License", d("49.50")),
                ],
            ),
            Section::new(
                SectionId::Hardware,
                vec![LineItem::new("switchboard", "Switchboard", d("3000"))
                    .locked()
                    .with_quantity(2)],
            ),
        ];
        repo.replace_sections(&sections).await.unwrap();

        let loaded = repo.load_sections().await.unwrap();
        assert_eq!(loaded, sections);

        repo.replace_sections(&sections[1..]).await.unwrap();
        let loaded = repo.load_sections().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, SectionId::Hardware);
    }
}
