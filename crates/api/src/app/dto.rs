use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;

use ampere_core::Money;
use ampere_finance::{
    Invoice, InvoiceDraft, InvoicePatch, Payment, PaymentDraft, PaymentPatch, PaymentTarget,
    SourceDocument, VendorInvoice, VendorInvoiceDraft, VendorInvoicePatch,
};
use ampere_purchasing::{
    LineItem, LineItemDraft, LineItemPatch, PurchaseOrder, PurchaseOrderDraft, PurchaseOrderPatch,
    VendorAssignment,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddInvoiceRequest {
    pub client_id: String,
    pub project_id: Option<String>,
    pub quotation_id: Option<String>,
    pub amount: Money,
    pub gst_amount: Option<Money>,
    pub status: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub quotation_id: Option<String>,
    pub amount: Option<Money>,
    pub gst_amount: Option<Money>,
    pub status: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddVendorInvoiceRequest {
    pub vendor_id: String,
    pub project_id: Option<String>,
    pub purchase_order_id: Option<String>,
    pub amount: Money,
    pub gst_amount: Option<Money>,
    pub status: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub source_document: Option<SourceDocument>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVendorInvoiceRequest {
    pub vendor_id: Option<String>,
    pub project_id: Option<String>,
    pub purchase_order_id: Option<String>,
    pub amount: Option<Money>,
    pub gst_amount: Option<Money>,
    pub status: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub source_document: Option<SourceDocument>,
}

#[derive(Debug, Deserialize)]
pub struct AddPaymentRequest {
    pub amount: Money,
    pub method: Option<String>,
    pub reference: Option<String>,
    pub received_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub amount: Option<Money>,
    pub method: Option<String>,
    pub reference: Option<String>,
    pub received_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    pub description: String,
    pub quantity: i64,
    pub unit: Option<String>,
    pub unit_price: Money,
    pub category: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLineItemRequest {
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub unit_price: Option<Money>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddPurchaseOrderRequest {
    pub vendor_id: String,
    pub project_id: String,
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
    pub status: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub required_date: Option<NaiveDate>,
    pub discount: Option<Money>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseOrderRequest {
    pub status: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub required_date: Option<NaiveDate>,
    pub discount: Option<Money>,
    pub notes: Option<String>,
    pub items: Option<Vec<LineItemRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct AssignVendorRequest {
    pub project_id: String,
    pub vendor_id: String,
    pub budget_allocated: Money,
}

// -------------------------
// List query parameters
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListQuery {
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub overdue: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VendorInvoiceListQuery {
    pub vendor_id: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub overdue: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseOrderListQuery {
    pub vendor_id: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentListQuery {
    pub project_id: Option<String>,
}

// -------------------------
// Request -> domain conversions
// -------------------------

pub fn to_invoice_draft(body: AddInvoiceRequest) -> Result<InvoiceDraft, axum::response::Response> {
    Ok(InvoiceDraft {
        client_id: parse_id(&body.client_id, "invalid client_id")?,
        project_id: parse_opt_id(body.project_id.as_deref(), "invalid project_id")?,
        quotation_id: parse_opt_id(body.quotation_id.as_deref(), "invalid quotation_id")?,
        amount: body.amount,
        gst_amount: body.gst_amount,
        status: body
            .status
            .as_deref()
            .map(errors::parse_invoice_status)
            .transpose()?,
        issue_date: body.issue_date,
        due_date: body.due_date,
    })
}

pub fn to_invoice_patch(body: UpdateInvoiceRequest) -> Result<InvoicePatch, axum::response::Response> {
    Ok(InvoicePatch {
        client_id: parse_opt_id(body.client_id.as_deref(), "invalid client_id")?,
        project_id: parse_opt_id(body.project_id.as_deref(), "invalid project_id")?,
        quotation_id: parse_opt_id(body.quotation_id.as_deref(), "invalid quotation_id")?,
        amount: body.amount,
        gst_amount: body.gst_amount,
        status: body
            .status
            .as_deref()
            .map(errors::parse_invoice_status)
            .transpose()?,
        issue_date: body.issue_date,
        due_date: body.due_date,
        paid_date: body.paid_date,
        payment_method: body
            .payment_method
            .as_deref()
            .map(errors::parse_payment_method)
            .transpose()?,
    })
}

pub fn to_vendor_invoice_draft(
    body: AddVendorInvoiceRequest,
) -> Result<VendorInvoiceDraft, axum::response::Response> {
    Ok(VendorInvoiceDraft {
        vendor_id: parse_id(&body.vendor_id, "invalid vendor_id")?,
        project_id: parse_opt_id(body.project_id.as_deref(), "invalid project_id")?,
        purchase_order_id: parse_opt_id(body.purchase_order_id.as_deref(), "invalid purchase_order_id")?,
        amount: body.amount,
        gst_amount: body.gst_amount,
        status: body
            .status
            .as_deref()
            .map(errors::parse_vendor_invoice_status)
            .transpose()?,
        issue_date: body.issue_date,
        due_date: body.due_date,
        source_document: body.source_document,
    })
}

pub fn to_vendor_invoice_patch(
    body: UpdateVendorInvoiceRequest,
) -> Result<VendorInvoicePatch, axum::response::Response> {
    Ok(VendorInvoicePatch {
        vendor_id: parse_opt_id(body.vendor_id.as_deref(), "invalid vendor_id")?,
        project_id: parse_opt_id(body.project_id.as_deref(), "invalid project_id")?,
        purchase_order_id: parse_opt_id(body.purchase_order_id.as_deref(), "invalid purchase_order_id")?,
        amount: body.amount,
        gst_amount: body.gst_amount,
        status: body
            .status
            .as_deref()
            .map(errors::parse_vendor_invoice_status)
            .transpose()?,
        issue_date: body.issue_date,
        due_date: body.due_date,
        paid_date: body.paid_date,
        payment_method: body
            .payment_method
            .as_deref()
            .map(errors::parse_payment_method)
            .transpose()?,
        source_document: body.source_document,
    })
}

pub fn to_payment_draft(body: AddPaymentRequest) -> Result<PaymentDraft, axum::response::Response> {
    Ok(PaymentDraft {
        amount: body.amount,
        method: body
            .method
            .as_deref()
            .map(errors::parse_payment_method)
            .transpose()?,
        reference: body.reference,
        received_date: body.received_date,
        notes: body.notes,
    })
}

pub fn to_payment_patch(body: UpdatePaymentRequest) -> Result<PaymentPatch, axum::response::Response> {
    Ok(PaymentPatch {
        amount: body.amount,
        method: body
            .method
            .as_deref()
            .map(errors::parse_payment_method)
            .transpose()?,
        reference: body.reference,
        received_date: body.received_date,
        notes: body.notes,
    })
}

pub fn to_line_item_draft(body: LineItemRequest) -> LineItemDraft {
    LineItemDraft {
        description: body.description,
        quantity: body.quantity,
        unit: body.unit,
        unit_price: body.unit_price,
        category: body.category,
        notes: body.notes,
    }
}

pub fn to_line_item_patch(body: UpdateLineItemRequest) -> LineItemPatch {
    LineItemPatch {
        description: body.description,
        quantity: body.quantity,
        unit: body.unit,
        unit_price: body.unit_price,
        category: body.category,
        notes: body.notes,
    }
}

pub fn to_purchase_order_draft(
    body: AddPurchaseOrderRequest,
) -> Result<PurchaseOrderDraft, axum::response::Response> {
    Ok(PurchaseOrderDraft {
        vendor_id: parse_id(&body.vendor_id, "invalid vendor_id")?,
        project_id: parse_id(&body.project_id, "invalid project_id")?,
        items: body.items.into_iter().map(to_line_item_draft).collect(),
        status: body
            .status
            .as_deref()
            .map(errors::parse_purchase_order_status)
            .transpose()?,
        order_date: body.order_date,
        required_date: body.required_date,
        discount: body.discount,
        notes: body.notes,
    })
}

pub fn to_purchase_order_patch(
    body: UpdatePurchaseOrderRequest,
) -> Result<PurchaseOrderPatch, axum::response::Response> {
    Ok(PurchaseOrderPatch {
        status: body
            .status
            .as_deref()
            .map(errors::parse_purchase_order_status)
            .transpose()?,
        order_date: body.order_date,
        required_date: body.required_date,
        discount: body.discount,
        notes: body.notes,
        items: body
            .items
            .map(|items| items.into_iter().map(to_line_item_draft).collect()),
    })
}

pub fn parse_id<T>(value: &str, message: &'static str) -> Result<T, axum::response::Response>
where
    T: std::str::FromStr,
{
    value
        .parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", message))
}

pub fn parse_opt_id<T>(
    value: Option<&str>,
    message: &'static str,
) -> Result<Option<T>, axum::response::Response>
where
    T: std::str::FromStr,
{
    value.map(|v| parse_id(v, message)).transpose()
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn invoice_to_json(invoice: &Invoice) -> serde_json::Value {
    serde_json::json!({
        "id": invoice.id_typed(),
        "invoice_number": invoice.invoice_number(),
        "client_id": invoice.client_id(),
        "project_id": invoice.project_id(),
        "quotation_id": invoice.quotation_id(),
        "amount": invoice.amount(),
        "gst_amount": invoice.gst_amount(),
        "total_amount": invoice.total_amount(),
        "status": invoice.status(),
        "issue_date": invoice.issue_date(),
        "due_date": invoice.due_date(),
        "paid_date": invoice.paid_date(),
        "payment_method": invoice.payment_method(),
        "created_at": invoice.created_at(),
    })
}

pub fn vendor_invoice_to_json(invoice: &VendorInvoice) -> serde_json::Value {
    serde_json::json!({
        "id": invoice.id_typed(),
        "invoice_number": invoice.invoice_number(),
        "vendor_id": invoice.vendor_id(),
        "project_id": invoice.project_id(),
        "purchase_order_id": invoice.purchase_order_id(),
        "amount": invoice.amount(),
        "gst_amount": invoice.gst_amount(),
        "total_amount": invoice.total_amount(),
        "status": invoice.status(),
        "issue_date": invoice.issue_date(),
        "due_date": invoice.due_date(),
        "paid_date": invoice.paid_date(),
        "payment_method": invoice.payment_method(),
        "source_document": invoice.source_document(),
        "created_at": invoice.created_at(),
    })
}

pub fn payment_to_json(payment: &Payment) -> serde_json::Value {
    let (payer, invoice_id) = match payment.target() {
        PaymentTarget::Client(id) => ("client", id.to_string()),
        PaymentTarget::Vendor(id) => ("vendor", id.to_string()),
    };
    serde_json::json!({
        "id": payment.id_typed(),
        "payer": payer,
        "invoice_id": invoice_id,
        "amount": payment.amount(),
        "method": payment.method(),
        "reference": payment.reference(),
        "received_date": payment.received_date(),
        "notes": payment.notes(),
        "created_at": payment.created_at(),
    })
}

pub fn line_item_to_json(item: &LineItem) -> serde_json::Value {
    serde_json::json!({
        "id": item.id(),
        "description": item.description(),
        "quantity": item.quantity(),
        "unit": item.unit(),
        "unit_price": item.unit_price(),
        "total": item.total(),
        "category": item.category(),
        "notes": item.notes(),
    })
}

pub fn purchase_order_to_json(order: &PurchaseOrder) -> serde_json::Value {
    serde_json::json!({
        "id": order.id_typed(),
        "po_number": order.po_number(),
        "vendor_id": order.vendor_id(),
        "project_id": order.project_id(),
        "items": order.items().iter().map(line_item_to_json).collect::<Vec<_>>(),
        "subtotal": order.subtotal(),
        "gst_amount": order.gst_amount(),
        "discount": order.discount(),
        "total_amount": order.total_amount(),
        "status": order.status(),
        "order_date": order.order_date(),
        "required_date": order.required_date(),
        "notes": order.notes(),
        "created_at": order.created_at(),
    })
}

pub fn assignment_to_json(assignment: &VendorAssignment) -> serde_json::Value {
    serde_json::json!({
        "project_id": assignment.project_id(),
        "vendor_id": assignment.vendor_id(),
        "budget_allocated": assignment.budget_allocated(),
        "budget_used": assignment.budget_used(),
        "budget_remaining": assignment.budget_remaining(),
    })
}
