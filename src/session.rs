//! Mutable state of a single quote being built.

use crate::domain::{
    defaults, CatalogueError, DealDetails, DealDetailsPatch, Decimal, LineItem, RateTables,
    Section, SectionId,
};
use crate::engine::{
    compute_quote, compute_settlement, Quote, SettlementRequest, SettlementResult,
};
use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

const SESSION_ITEM_PREFIX: &str = "session-";

/// Catalogue selections and deal parameters for one quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSession {
    sections: Vec<Section>,
    deal: DealDetails,
}

impl Default for QuoteSession {
    fn default() -> Self {
        Self::new(defaults::fallback_sections())
    }
}

impl QuoteSession {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            sections,
            deal: DealDetails::default(),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn deal_details(&self) -> &DealDetails {
        &self.deal
    }

    /// Whether an item id was allocated by [`QuoteSession::add_session_item`].
    pub fn is_session_item(id: &str) -> bool {
        id.starts_with(SESSION_ITEM_PREFIX)
    }

    /// Add an ad-hoc item that exists only for this quote. Returns its id.
    pub fn add_session_item(
        &mut self,
        section: SectionId,
        name: &str,
        cost: Decimal,
    ) -> Result<String, CatalogueError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogueError::InvalidItem(
                "session item name must not be empty".to_string(),
            ));
        }
        if !cost.is_positive() {
            return Err(CatalogueError::InvalidItem(format!(
                "session item '{}' must have a positive cost",
                name
            )));
        }

        let id = format!("{}{}", SESSION_ITEM_PREFIX, Uuid::new_v4());
        self.section_mut(section)?
            .items
            .push(LineItem::new(id.clone(), name, cost));
        debug!(section = %section, item = %id, "Added session item");
        Ok(id)
    }

    pub fn update_quantity(
        &mut self,
        section: SectionId,
        item: &str,
        quantity: u32,
    ) -> Result<(), CatalogueError> {
        self.item_mut(section, item)?.quantity = quantity;
        Ok(())
    }

    pub fn update_item_cost(
        &mut self,
        section: SectionId,
        item: &str,
        cost: Decimal,
    ) -> Result<(), CatalogueError> {
        if cost.is_negative() {
            return Err(CatalogueError::NegativeCost {
                section,
                item: item.to_string(),
            });
        }
        self.item_mut(section, item)?.unit_cost = cost;
        Ok(())
    }

    pub fn update_item_name(
        &mut self,
        section: SectionId,
        item: &str,
        name: &str,
    ) -> Result<(), CatalogueError> {
        self.item_mut(section, item)?.name = name.to_string();
        Ok(())
    }

    /// Replace a section's items wholesale.
    pub fn update_items(
        &mut self,
        section: SectionId,
        items: Vec<LineItem>,
    ) -> Result<(), CatalogueError> {
        self.section_mut(section)?.items = items;
        Ok(())
    }

    pub fn update_deal_details(&mut self, patch: DealDetailsPatch) {
        self.deal.apply(patch);
    }

    pub fn replace_deal_details(&mut self, deal: DealDetails) {
        self.deal = deal;
    }

    /// Run the settlement calculator and, when it produces a result, write
    /// the total back into the deal's settlement amount.
    pub fn apply_settlement(
        &mut self,
        request: &SettlementRequest,
        as_of: NaiveDate,
    ) -> Option<SettlementResult> {
        let result = compute_settlement(request, as_of)?;
        info!(
            total = %result.total_settlement,
            years = result.year_breakdown.len(),
            "Applied settlement to deal"
        );
        self.deal.settlement = result.total_settlement;
        Some(result)
    }

    pub fn totals(&self, rates: &RateTables) -> Quote {
        compute_quote(&self.sections, &self.deal, rates)
    }

    /// Start a new quote on the same catalogue.
    pub fn reset(&mut self) {
        self.deal = DealDetails::default();
        for section in &mut self.sections {
            section.items.retain(|item| !Self::is_session_item(&item.id));
            for item in &mut section.items {
                item.quantity = 0;
            }
        }
    }

    fn section_mut(&mut self, id: SectionId) -> Result<&mut Section, CatalogueError> {
        self.sections
            .iter_mut()
            .find(|section| section.id == id)
            .ok_or_else(|| CatalogueError::UnknownSection(id.to_string()))
    }

    fn item_mut(&mut self, section: SectionId, item: &str) -> Result<&mut LineItem, CatalogueError> {
        self.section_mut(section)?
            .item_mut(item)
            .ok_or_else(|| CatalogueError::UnknownItem {
                section,
                item: item.to_string(),
            })
    }
}
