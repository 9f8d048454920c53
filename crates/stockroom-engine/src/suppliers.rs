//! # Supplier Restock Recorder
//!
//! Suppliers and the restock documents sent to them. Pure record-keeping:
//! recording, receiving, or cancelling a list never changes product stock.
//! Stock arrives through [`crate::InventoryLedger::restock`].
//!
//! ```text
//!   record_order_list ──► PENDING ──┬──► RECEIVED
//!                                   └──► CANCELLED
//! ```

use stockroom_core::validation::{validate_email, validate_name, validate_phone};
use stockroom_core::{
    CoreError, Supplier, SupplierOrderList, SupplierOrderStatus, ValidationError,
};
use stockroom_db::{Database, NewSupplierOrderLine};
use tracing::{info, warn};

use crate::error::EngineResult;

/// Most lines accepted on one supplier order list.
pub const MAX_SUPPLIER_ORDER_LINES: usize = 500;

/// Contact details of a supplier, as submitted.
#[derive(Debug, Clone, Default)]
pub struct SupplierDetails {
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
}

impl SupplierDetails {
    fn validate(&self) -> EngineResult<()> {
        validate_name("name", &self.name)?;
        if let Some(email) = non_blank(&self.contact_email) {
            validate_email(email)?;
        }
        if let Some(phone) = non_blank(&self.phone) {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
pub struct SupplierRecorder {
    db: Database,
}

impl SupplierRecorder {
    pub fn new(db: Database) -> Self {
        SupplierRecorder { db }
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn create_supplier(&self, details: &SupplierDetails) -> EngineResult<Supplier> {
        details.validate()?;
        let supplier = self
            .db
            .suppliers()
            .create(
                &details.name,
                non_blank(&details.contact_email),
                non_blank(&details.phone),
            )
            .await?;

        info!(id = %supplier.id, "Supplier created");
        Ok(supplier)
    }

    pub async fn update_supplier(&self, id: &str, details: &SupplierDetails) -> EngineResult<Supplier> {
        details.validate()?;
        self.supplier(id).await?;

        Ok(self
            .db
            .suppliers()
            .update(
                id,
                &details.name,
                non_blank(&details.contact_email),
                non_blank(&details.phone),
            )
            .await?)
    }

    pub async fn supplier(&self, id: &str) -> EngineResult<Supplier> {
        Ok(self
            .db
            .suppliers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SupplierNotFound(id.to_string()))?)
    }

    pub async fn list_suppliers(&self) -> EngineResult<Vec<Supplier>> {
        Ok(self.db.suppliers().list().await?)
    }

    // =========================================================================
    // Supplier order lists
    // =========================================================================

    /// Records a restock document in `pending`.
    ///
    /// ## Errors
    /// - `SupplierNotFound` / `ProductNotFound` for unknown references
    /// - `Validation` for an empty list, a non-positive quantity, or a
    ///   negative unit cost
    pub async fn record_order_list(
        &self,
        supplier_id: &str,
        lines: &[NewSupplierOrderLine],
    ) -> EngineResult<SupplierOrderList> {
        if lines.is_empty() {
            return Err(ValidationError::Required {
                field: "lines".into(),
            }
            .into());
        }
        if lines.len() > MAX_SUPPLIER_ORDER_LINES {
            return Err(ValidationError::OutOfRange {
                field: "lines".into(),
                min: 1,
                max: MAX_SUPPLIER_ORDER_LINES as i64,
            }
            .into());
        }
        for line in lines {
            if line.quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".into(),
                }
                .into());
            }
            if line.unit_cost_cents < 0 {
                return Err(ValidationError::OutOfRange {
                    field: "unit_cost_cents".into(),
                    min: 0,
                    max: i64::MAX,
                }
                .into());
            }
        }

        self.supplier(supplier_id).await?;
        for line in lines {
            if self.db.products().get_by_id(&line.product_id).await?.is_none() {
                return Err(CoreError::ProductNotFound(line.product_id.clone()).into());
            }
        }

        let list = self.db.suppliers().create_order_list(supplier_id, lines).await?;
        info!(
            id = %list.id,
            supplier_id = %supplier_id,
            lines = list.lines.len(),
            total_cost_cents = list.total_cost_cents,
            "Supplier order list recorded"
        );
        Ok(list)
    }

    pub async fn order_list(&self, id: &str) -> EngineResult<SupplierOrderList> {
        Ok(self
            .db
            .suppliers()
            .get_order_list(id)
            .await?
            .ok_or_else(|| CoreError::SupplierOrderListNotFound(id.to_string()))?)
    }

    pub async fn list_order_lists(&self) -> EngineResult<Vec<SupplierOrderList>> {
        Ok(self.db.suppliers().list_order_lists().await?)
    }

    pub async fn order_lists_of(&self, supplier_id: &str) -> EngineResult<Vec<SupplierOrderList>> {
        self.supplier(supplier_id).await?;
        Ok(self
            .db
            .suppliers()
            .list_order_lists_by_supplier(supplier_id)
            .await?)
    }

    /// Marks a pending list received or cancelled.
    pub async fn set_order_list_status(
        &self,
        id: &str,
        next: SupplierOrderStatus,
    ) -> EngineResult<SupplierOrderList> {
        let current = self.order_list(id).await?;
        let rejected = || CoreError::InvalidSupplierOrderTransition {
            list_id: id.to_string(),
            from: current.status,
            to: next,
        };

        if !current.status.can_transition_to(next) {
            warn!(id = %id, from = %current.status, to = %next, "Rejected supplier order status change");
            return Err(rejected().into());
        }
        if !self
            .db
            .suppliers()
            .set_order_list_status(id, current.status, next)
            .await?
        {
            return Err(rejected().into());
        }

        info!(id = %id, status = %next, "Supplier order list status changed");
        self.order_list(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::test_support::{db, stock_of, with_product};

    fn details(name: &str) -> SupplierDetails {
        SupplierDetails {
            name: name.to_string(),
            contact_email: Some("orders@acme.test".to_string()),
            phone: None,
        }
    }

    fn line(product_id: &str, quantity: i64, unit_cost_cents: i64) -> NewSupplierOrderLine {
        NewSupplierOrderLine {
            product_id: product_id.to_string(),
            quantity,
            unit_cost_cents,
        }
    }

    #[tokio::test]
    async fn test_record_list_has_no_stock_effect() {
        let db = db().await;
        let p = with_product(&db, "Valve", 300, 2).await;
        let recorder = SupplierRecorder::new(db.clone());
        let supplier = recorder.create_supplier(&details("Acme")).await.unwrap();

        let list = recorder
            .record_order_list(&supplier.id, &[line(&p.id, 40, 120)])
            .await
            .unwrap();
        assert_eq!(list.status, SupplierOrderStatus::Pending);
        assert_eq!(list.total_cost_cents, 4_800);

        let received = recorder
            .set_order_list_status(&list.id, SupplierOrderStatus::Received)
            .await
            .unwrap();
        assert_eq!(received.status, SupplierOrderStatus::Received);
        assert_eq!(stock_of(&db, &p.id).await, 2);

        assert!(matches!(
            recorder
                .set_order_list_status(&list.id, SupplierOrderStatus::Cancelled)
                .await
                .unwrap_err(),
            EngineError::Core(CoreError::InvalidSupplierOrderTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_record_list_rejects_bad_input() {
        let db = db().await;
        let p = with_product(&db, "Elbow", 300, 2).await;
        let recorder = SupplierRecorder::new(db.clone());
        let supplier = recorder.create_supplier(&details("Acme")).await.unwrap();

        assert!(matches!(
            recorder.record_order_list(&supplier.id, &[]).await.unwrap_err(),
            EngineError::Core(CoreError::Validation(_))
        ));
        assert!(matches!(
            recorder
                .record_order_list(&supplier.id, &[line(&p.id, 0, 10)])
                .await
                .unwrap_err(),
            EngineError::Core(CoreError::Validation(_))
        ));
        assert!(matches!(
            recorder
                .record_order_list("nobody", &[line(&p.id, 1, 10)])
                .await
                .unwrap_err(),
            EngineError::Core(CoreError::SupplierNotFound(_))
        ));
        assert!(matches!(
            recorder
                .record_order_list(&supplier.id, &[line("ghost", 1, 10)])
                .await
                .unwrap_err(),
            EngineError::Core(CoreError::ProductNotFound(_))
        ));
        assert!(recorder.list_order_lists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_supplier_update_and_lookup() {
        let db = db().await;
        let recorder = SupplierRecorder::new(db);
        let supplier = recorder.create_supplier(&details("Acme")).await.unwrap();

        let updated = recorder
            .update_supplier(
                &supplier.id,
                &SupplierDetails {
                    name: "Acme Supply".into(),
                    contact_email: None,
                    phone: Some("+1 555 0100".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Acme Supply");
        assert!(updated.contact_email.is_none());

        assert!(matches!(
            recorder.update_supplier("nobody", &details("X")).await.unwrap_err(),
            EngineError::Core(CoreError::SupplierNotFound(_))
        ));
        assert!(recorder.create_supplier(&details("  ")).await.is_err());
        assert_eq!(recorder.order_lists_of(&supplier.id).await.unwrap().len(), 0);
    }
}
