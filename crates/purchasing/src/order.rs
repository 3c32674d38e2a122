use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ampere_core::{
    DomainError, DomainResult, Entity, Money, ProjectId, VendorId, gst_breakdown,
    impl_uuid_newtype,
};

const DEFAULT_UNIT: &str = "pcs";
const DEFAULT_CATEGORY: &str = "Materials";
const DEFAULT_LEAD_DAYS: u64 = 30;

/// Purchase order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(Uuid);

/// Line item identifier, unique within the owning purchase order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(Uuid);

impl_uuid_newtype!(PurchaseOrderId, "PurchaseOrderId");
impl_uuid_newtype!(LineItemId, "LineItemId");

/// Purchase order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    PendingApproval,
    Approved,
    Sent,
    PartiallyReceived,
    Received,
    Cancelled,
    Closed,
}

/// Priced line on a purchase order.
///
/// Invariant: `total` is `quantity × unit_price` after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: LineItemId,
    description: String,
    quantity: i64,
    unit: String,
    unit_price: Money,
    total: Money,
    category: String,
    notes: Option<String>,
}

/// Line item fields supplied on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDraft {
    pub description: String,
    pub quantity: i64,
    pub unit: Option<String>,
    pub unit_price: Money,
    pub category: Option<String>,
    pub notes: Option<String>,
}

/// Partial line item update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemPatch {
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub unit_price: Option<Money>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl LineItem {
    fn from_draft(draft: LineItemDraft) -> DomainResult<Self> {
        let mut item = Self {
            id: LineItemId::new(),
            description: draft.description,
            quantity: draft.quantity,
            unit: draft.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            unit_price: draft.unit_price,
            total: Money::ZERO,
            category: draft
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            notes: draft.notes,
        };
        item.validate_and_price()?;
        Ok(item)
    }

    fn apply_patch(&mut self, patch: LineItemPatch) -> DomainResult<()> {
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(unit_price) = patch.unit_price {
            self.unit_price = unit_price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        self.validate_and_price()
    }

    fn validate_and_price(&mut self) -> DomainResult<()> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation(
                "line item description must not be empty",
            ));
        }
        if self.quantity <= 0 {
            return Err(DomainError::validation(
                "line item quantity must be positive",
            ));
        }
        if self.unit_price.is_negative() {
            return Err(DomainError::validation(
                "line item unit price cannot be negative",
            ));
        }
        self.total = self
            .unit_price
            .checked_mul(self.quantity)
            .ok_or_else(|| DomainError::invariant("line item total overflows"))?;
        Ok(())
    }

    pub fn id(&self) -> LineItemId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Purchase order fields supplied on creation. The vendor and project
/// references are fixed for the life of the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderDraft {
    pub vendor_id: VendorId,
    pub project_id: ProjectId,
    #[serde(default)]
    pub items: Vec<LineItemDraft>,
    pub status: Option<PurchaseOrderStatus>,
    pub order_date: Option<NaiveDate>,
    pub required_date: Option<NaiveDate>,
    pub discount: Option<Money>,
    pub notes: Option<String>,
}

/// Partial purchase order update; supplying `items` replaces the whole list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderPatch {
    pub status: Option<PurchaseOrderStatus>,
    pub order_date: Option<NaiveDate>,
    pub required_date: Option<NaiveDate>,
    pub discount: Option<Money>,
    pub notes: Option<String>,
    pub items: Option<Vec<LineItemDraft>>,
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    po_number: String,
    vendor_id: VendorId,
    project_id: ProjectId,
    items: Vec<LineItem>,
    subtotal: Money,
    gst_amount: Money,
    discount: Money,
    total_amount: Money,
    status: PurchaseOrderStatus,
    order_date: NaiveDate,
    required_date: NaiveDate,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// Build a purchase order from draft input, deriving totals from items.
    pub fn from_draft(
        draft: PurchaseOrderDraft,
        po_number: String,
        today: NaiveDate,
    ) -> DomainResult<Self> {
        let items = draft
            .items
            .into_iter()
            .map(LineItem::from_draft)
            .collect::<DomainResult<Vec<_>>>()?;

        let discount = draft.discount.unwrap_or(Money::ZERO);
        if discount.is_negative() {
            return Err(DomainError::validation("discount cannot be negative"));
        }

        let order_date = draft.order_date.unwrap_or(today);
        let required_date = match draft.required_date {
            Some(date) => date,
            None => order_date
                .checked_add_days(Days::new(DEFAULT_LEAD_DAYS))
                .ok_or_else(|| DomainError::invariant("required date out of range"))?,
        };

        let mut order = Self {
            id: PurchaseOrderId::new(),
            po_number,
            vendor_id: draft.vendor_id,
            project_id: draft.project_id,
            items,
            subtotal: Money::ZERO,
            gst_amount: Money::ZERO,
            discount,
            total_amount: Money::ZERO,
            status: draft.status.unwrap_or(PurchaseOrderStatus::Draft),
            order_date,
            required_date,
            notes: draft.notes,
            created_at: Utc::now(),
        };
        order.recompute_totals()?;
        Ok(order)
    }

    /// Merge a partial update; totals are re-derived afterwards.
    pub fn apply_patch(&mut self, patch: PurchaseOrderPatch) -> DomainResult<()> {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(order_date) = patch.order_date {
            self.order_date = order_date;
        }
        if let Some(required_date) = patch.required_date {
            self.required_date = required_date;
        }
        if let Some(discount) = patch.discount {
            if discount.is_negative() {
                return Err(DomainError::validation("discount cannot be negative"));
            }
            self.discount = discount;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(items) = patch.items {
            self.items = items
                .into_iter()
                .map(LineItem::from_draft)
                .collect::<DomainResult<Vec<_>>>()?;
        }
        self.recompute_totals()
    }

    /// Append a line item, returning the stored copy.
    pub fn add_item(&mut self, draft: LineItemDraft) -> DomainResult<LineItem> {
        let item = LineItem::from_draft(draft)?;
        self.items.push(item.clone());
        self.recompute_totals()?;
        Ok(item)
    }

    /// Update one line item in place, returning the updated copy.
    pub fn update_item(
        &mut self,
        item_id: LineItemId,
        patch: LineItemPatch,
    ) -> DomainResult<LineItem> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(DomainError::not_found)?;
        item.apply_patch(patch)?;
        let updated = item.clone();
        self.recompute_totals()?;
        Ok(updated)
    }

    /// Remove one line item, returning it.
    pub fn remove_item(&mut self, item_id: LineItemId) -> DomainResult<LineItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(DomainError::not_found)?;
        let removed = self.items.remove(index);
        self.recompute_totals()?;
        Ok(removed)
    }

    /// Invariant: subtotal = Σ item totals, gst = 7% of subtotal,
    /// total = subtotal + gst − discount.
    fn recompute_totals(&mut self) -> DomainResult<()> {
        let mut subtotal = Money::ZERO;
        for item in &self.items {
            subtotal = subtotal
                .checked_add(item.total)
                .ok_or_else(|| DomainError::invariant("purchase order subtotal overflows"))?;
        }
        let breakdown = gst_breakdown(subtotal)?;
        self.subtotal = subtotal;
        self.gst_amount = breakdown.gst_amount;
        self.total_amount = breakdown
            .total_amount
            .checked_sub(self.discount)
            .ok_or_else(|| DomainError::invariant("purchase order total overflows"))?;
        Ok(())
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn po_number(&self) -> &str {
        &self.po_number
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn item(&self, item_id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn gst_amount(&self) -> Money {
        self.gst_amount
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    pub fn required_date(&self) -> NaiveDate {
        self.required_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use ampere_core::GST_RATE_PERCENT;
    use proptest::prelude::*;

    use super::*;

    fn test_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn test_item(description: &str, quantity: i64, unit_price_cents: i64) -> LineItemDraft {
        LineItemDraft {
            description: description.to_string(),
            quantity,
            unit: None,
            unit_price: Money::from_cents(unit_price_cents),
            category: None,
            notes: None,
        }
    }

    fn test_draft(items: Vec<LineItemDraft>) -> PurchaseOrderDraft {
        PurchaseOrderDraft {
            vendor_id: VendorId::new(),
            project_id: ProjectId::new(),
            items,
            status: None,
            order_date: None,
            required_date: None,
            discount: None,
            notes: None,
        }
    }

    fn test_order(items: Vec<LineItemDraft>) -> PurchaseOrder {
        PurchaseOrder::from_draft(test_draft(items), "AMP-PO-202403-001".to_string(), test_today())
            .unwrap()
    }

    #[test]
    fn totals_derive_from_items() {
        let order = test_order(vec![
            test_item("rebar", 2, 25_000),
            test_item("cement", 1, 10_000),
        ]);

        assert_eq!(order.subtotal(), Money::from_cents(60_000));
        assert_eq!(order.gst_amount(), Money::from_cents(4_200));
        assert_eq!(order.total_amount(), Money::from_cents(64_200));
    }

    #[test]
    fn discount_reduces_the_total() {
        let mut draft = test_draft(vec![test_item("rebar", 2, 25_000)]);
        draft.discount = Some(Money::from_cents(5_000));
        let order =
            PurchaseOrder::from_draft(draft, "AMP-PO-202403-001".to_string(), test_today())
                .unwrap();

        assert_eq!(order.subtotal(), Money::from_cents(50_000));
        assert_eq!(order.gst_amount(), Money::from_cents(3_500));
        assert_eq!(order.total_amount(), Money::from_cents(48_500));
    }

    #[test]
    fn creation_applies_defaults() {
        let order = test_order(vec![test_item("rebar", 1, 100)]);

        assert_eq!(order.status(), PurchaseOrderStatus::Draft);
        assert_eq!(order.order_date(), test_today());
        assert_eq!(
            order.required_date(),
            NaiveDate::from_ymd_opt(2024, 4, 14).unwrap()
        );
        assert_eq!(order.items()[0].unit(), "pcs");
        assert_eq!(order.items()[0].category(), "Materials");
    }

    #[test]
    fn rejects_invalid_line_items() {
        let blank = test_draft(vec![test_item("   ", 1, 100)]);
        assert!(matches!(
            PurchaseOrder::from_draft(blank, "AMP-PO-202403-001".to_string(), test_today()),
            Err(DomainError::Validation(_))
        ));

        let zero_quantity = test_draft(vec![test_item("rebar", 0, 100)]);
        assert!(matches!(
            PurchaseOrder::from_draft(
                zero_quantity,
                "AMP-PO-202403-001".to_string(),
                test_today()
            ),
            Err(DomainError::Validation(_))
        ));

        let negative_price = test_draft(vec![test_item("rebar", 1, -100)]);
        assert!(matches!(
            PurchaseOrder::from_draft(
                negative_price,
                "AMP-PO-202403-001".to_string(),
                test_today()
            ),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn rejects_negative_discount() {
        let mut draft = test_draft(vec![test_item("rebar", 1, 100)]);
        draft.discount = Some(Money::from_cents(-1));
        assert!(matches!(
            PurchaseOrder::from_draft(draft, "AMP-PO-202403-001".to_string(), test_today()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn add_item_recomputes_totals() {
        let mut order = test_order(vec![test_item("rebar", 2, 25_000)]);
        order.add_item(test_item("cement", 1, 10_000)).unwrap();

        assert_eq!(order.items().len(), 2);
        assert_eq!(order.subtotal(), Money::from_cents(60_000));
        assert_eq!(order.total_amount(), Money::from_cents(64_200));
    }

    #[test]
    fn update_item_reprices_the_line() {
        let mut order = test_order(vec![test_item("rebar", 2, 25_000)]);
        let item_id = order.items()[0].id();

        let updated = order
            .update_item(
                item_id,
                LineItemPatch {
                    quantity: Some(3),
                    ..LineItemPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.total(), Money::from_cents(75_000));
        assert_eq!(order.subtotal(), Money::from_cents(75_000));
        assert_eq!(order.gst_amount(), Money::from_cents(5_250));
    }

    #[test]
    fn remove_item_recomputes_totals() {
        let mut order = test_order(vec![
            test_item("rebar", 2, 25_000),
            test_item("cement", 1, 10_000),
        ]);
        let item_id = order.items()[1].id();

        let removed = order.remove_item(item_id).unwrap();
        assert_eq!(removed.total(), Money::from_cents(10_000));
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.subtotal(), Money::from_cents(50_000));
    }

    #[test]
    fn missing_item_is_not_found() {
        let mut order = test_order(vec![test_item("rebar", 2, 25_000)]);
        assert!(matches!(
            order.remove_item(LineItemId::new()),
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            order.update_item(LineItemId::new(), LineItemPatch::default()),
            Err(DomainError::NotFound)
        ));
    }

    #[test]
    fn patch_replaces_items_and_rederives_totals() {
        let mut order = test_order(vec![test_item("rebar", 2, 25_000)]);
        order
            .apply_patch(PurchaseOrderPatch {
                status: Some(PurchaseOrderStatus::Approved),
                items: Some(vec![test_item("gravel", 4, 5_000)]),
                ..PurchaseOrderPatch::default()
            })
            .unwrap();

        assert_eq!(order.status(), PurchaseOrderStatus::Approved);
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.subtotal(), Money::from_cents(20_000));
        assert_eq!(order.total_amount(), Money::from_cents(21_400));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256, ..ProptestConfig::default()
        })]

        /// Totals stay mutually consistent for arbitrary item sets.
        #[test]
        fn totals_stay_consistent(
            lines in proptest::collection::vec((1i64..1_000, 0i64..10_000_000), 1..8)
        ) {
            let items = lines
                .iter()
                .map(|(quantity, price)| test_item("materials", *quantity, *price))
                .collect();
            let order = test_order(items);

            let mut sum = Money::ZERO;
            for item in order.items() {
                sum = sum.checked_add(item.total()).unwrap();
            }
            prop_assert_eq!(order.subtotal(), sum);
            prop_assert_eq!(order.gst_amount(), sum.percent(GST_RATE_PERCENT).unwrap());
            prop_assert_eq!(
                order.total_amount(),
                sum.checked_add(order.gst_amount()).unwrap()
            );
        }
    }
}
