//! Permission catalog: the closed set of fine-grained capabilities.
//!
//! Permissions are a compile-time enumeration, never raw strings. Adding a
//! capability means adding a variant here (and optionally to a group in
//! [`groups`]); the string form exists only at serialization boundaries.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use bizgrid_core::{DomainError, EntityKind};

/// An atomic capability identifier.
///
/// Organized by feature domain with CRUD-style actions. The serialized form
/// is `"<domain>.<action>"` (e.g. `"products.create"`), matching what route
/// guards and audit entries display.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // User management
    #[serde(rename = "users.view")]
    ViewUsers,
    #[serde(rename = "users.create")]
    CreateUsers,
    #[serde(rename = "users.edit")]
    EditUsers,
    #[serde(rename = "users.delete")]
    DeleteUsers,

    // Company management (system administration)
    #[serde(rename = "companies.view")]
    ViewCompanies,
    #[serde(rename = "companies.create")]
    CreateCompanies,
    #[serde(rename = "companies.edit")]
    EditCompanies,
    #[serde(rename = "companies.delete")]
    DeleteCompanies,

    // Products / inventory
    #[serde(rename = "products.view")]
    ViewProducts,
    #[serde(rename = "products.create")]
    CreateProducts,
    #[serde(rename = "products.edit")]
    EditProducts,
    #[serde(rename = "products.delete")]
    DeleteProducts,

    // Sales / invoices
    #[serde(rename = "invoices.view")]
    ViewInvoices,
    #[serde(rename = "invoices.create")]
    CreateInvoices,
    #[serde(rename = "invoices.edit")]
    EditInvoices,
    #[serde(rename = "invoices.delete")]
    DeleteInvoices,

    // Purchases
    #[serde(rename = "purchases.view")]
    ViewPurchases,
    #[serde(rename = "purchases.create")]
    CreatePurchases,
    #[serde(rename = "purchases.edit")]
    EditPurchases,
    #[serde(rename = "purchases.delete")]
    DeletePurchases,

    // Warehouse
    #[serde(rename = "warehouse.view")]
    ViewWarehouse,
    #[serde(rename = "warehouse.manage")]
    ManageWarehouse,

    // Accounting / reports
    #[serde(rename = "reports.view")]
    ViewReports,
    #[serde(rename = "reports.export")]
    ExportReports,
    #[serde(rename = "financials.view")]
    ViewFinancials,

    // System administration
    #[serde(rename = "audit.view")]
    ViewAuditLogs,
    #[serde(rename = "settings.view")]
    ViewSettings,
    #[serde(rename = "settings.edit")]
    EditSettings,
}

impl Permission {
    /// The full permission universe.
    pub const ALL: [Permission; 28] = [
        Permission::ViewUsers,
        Permission::CreateUsers,
        Permission::EditUsers,
        Permission::DeleteUsers,
        Permission::ViewCompanies,
        Permission::CreateCompanies,
        Permission::EditCompanies,
        Permission::DeleteCompanies,
        Permission::ViewProducts,
        Permission::CreateProducts,
        Permission::EditProducts,
        Permission::DeleteProducts,
        Permission::ViewInvoices,
        Permission::CreateInvoices,
        Permission::EditInvoices,
        Permission::DeleteInvoices,
        Permission::ViewPurchases,
        Permission::CreatePurchases,
        Permission::EditPurchases,
        Permission::DeletePurchases,
        Permission::ViewWarehouse,
        Permission::ManageWarehouse,
        Permission::ViewReports,
        Permission::ExportReports,
        Permission::ViewFinancials,
        Permission::ViewAuditLogs,
        Permission::ViewSettings,
        Permission::EditSettings,
    ];

    /// Stable wire name (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewUsers => "users.view",
            Permission::CreateUsers => "users.create",
            Permission::EditUsers => "users.edit",
            Permission::DeleteUsers => "users.delete",
            Permission::ViewCompanies => "companies.view",
            Permission::CreateCompanies => "companies.create",
            Permission::EditCompanies => "companies.edit",
            Permission::DeleteCompanies => "companies.delete",
            Permission::ViewProducts => "products.view",
            Permission::CreateProducts => "products.create",
            Permission::EditProducts => "products.edit",
            Permission::DeleteProducts => "products.delete",
            Permission::ViewInvoices => "invoices.view",
            Permission::CreateInvoices => "invoices.create",
            Permission::EditInvoices => "invoices.edit",
            Permission::DeleteInvoices => "invoices.delete",
            Permission::ViewPurchases => "purchases.view",
            Permission::CreatePurchases => "purchases.create",
            Permission::EditPurchases => "purchases.edit",
            Permission::DeletePurchases => "purchases.delete",
            Permission::ViewWarehouse => "warehouse.view",
            Permission::ManageWarehouse => "warehouse.manage",
            Permission::ViewReports => "reports.view",
            Permission::ExportReports => "reports.export",
            Permission::ViewFinancials => "financials.view",
            Permission::ViewAuditLogs => "audit.view",
            Permission::ViewSettings => "settings.view",
            Permission::EditSettings => "settings.edit",
        }
    }

    /// The permission required to *view* a given entity type.
    ///
    /// Entity-history reads are gated by the entity's own view permission,
    /// not the global audit permission.
    pub fn view_for(kind: EntityKind) -> Permission {
        match kind {
            EntityKind::User => Permission::ViewUsers,
            EntityKind::Company => Permission::ViewCompanies,
            EntityKind::Product => Permission::ViewProducts,
            EntityKind::Invoice => Permission::ViewInvoices,
            EntityKind::Purchase => Permission::ViewPurchases,
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown permission: {s}")))
    }
}

/// Named permission groups: unions of individual permissions, defined once
/// and reused for role composition and readable route guards.
pub mod groups {
    use super::Permission;

    pub const USER_READ: &[Permission] = &[Permission::ViewUsers];

    pub const FULL_USER_MANAGEMENT: &[Permission] = &[
        Permission::ViewUsers,
        Permission::CreateUsers,
        Permission::EditUsers,
        Permission::DeleteUsers,
    ];

    pub const COMPANY_MANAGEMENT: &[Permission] = &[
        Permission::ViewCompanies,
        Permission::CreateCompanies,
        Permission::EditCompanies,
        Permission::DeleteCompanies,
    ];

    pub const FULL_PRODUCT_MANAGEMENT: &[Permission] = &[
        Permission::ViewProducts,
        Permission::CreateProducts,
        Permission::EditProducts,
        Permission::DeleteProducts,
    ];

    /// View/create/edit (no delete) — the data-entry subset.
    pub const PRODUCT_ENTRY: &[Permission] = &[
        Permission::ViewProducts,
        Permission::CreateProducts,
        Permission::EditProducts,
    ];

    pub const FULL_INVOICE_MANAGEMENT: &[Permission] = &[
        Permission::ViewInvoices,
        Permission::CreateInvoices,
        Permission::EditInvoices,
        Permission::DeleteInvoices,
    ];

    pub const INVOICE_ENTRY: &[Permission] = &[
        Permission::ViewInvoices,
        Permission::CreateInvoices,
        Permission::EditInvoices,
    ];

    pub const FULL_PURCHASE_MANAGEMENT: &[Permission] = &[
        Permission::ViewPurchases,
        Permission::CreatePurchases,
        Permission::EditPurchases,
        Permission::DeletePurchases,
    ];

    pub const PURCHASE_ENTRY: &[Permission] = &[
        Permission::ViewPurchases,
        Permission::CreatePurchases,
        Permission::EditPurchases,
    ];

    pub const WAREHOUSE_READ: &[Permission] = &[Permission::ViewWarehouse];

    pub const FULL_WAREHOUSE: &[Permission] =
        &[Permission::ViewWarehouse, Permission::ManageWarehouse];

    /// Reports + financial visibility.
    pub const ACCOUNTING: &[Permission] = &[
        Permission::ViewReports,
        Permission::ExportReports,
        Permission::ViewFinancials,
    ];

    pub const SETTINGS: &[Permission] = &[Permission::ViewSettings, Permission::EditSettings];
}
