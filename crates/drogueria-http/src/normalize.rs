//! # Wire Normalization
//!
//! The backend is not consistent about field names: the same value arrives
//! as `nombre`, `nombreProducto` or `nombreFormaVenta` depending on the
//! endpoint, prices come as floats, and dates come with or without a time.
//! Every response is read into a `Wire*` struct here and converted to the
//! canonical `drogueria-core` type once.
//!
//! ```text
//! JSON ──serde (aliases, defaults)──► Wire* ──into_domain()──► core type
//!                                         │
//!                                         └── negatives clamped, floats rounded
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use drogueria_core::{
    CashRegisterStatus, Client, ClosingRecord, ElectronicInvoice, Money, Movement, MovementKind,
    Page, ProductSummary, Quantity, Sale, SaleDetail, SaleDetailLine, SaleDraft, SavedSale,
    UnitOfSale,
};

// =============================================================================
// Scalars
// =============================================================================

/// Whole pesos from a JSON number that may carry decimals.
pub fn money_from_wire(value: f64) -> Money {
    if !value.is_finite() {
        return Money::zero();
    }
    Money::from_pesos(value.round() as i64)
}

/// Stock from the wire; negative stock is read as zero.
pub fn stock_from_wire(value: f64) -> Quantity {
    let quantity = Quantity::from_f64(value);
    if quantity.is_positive() {
        quantity
    } else {
        Quantity::zero()
    }
}

/// Reads the timestamp shapes the backend emits.
///
/// Accepts ISO date-times with or without fraction, a space separator, and
/// bare dates (read as midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    // drop a trailing offset such as "Z" or "-05:00"
    let local = raw
        .strip_suffix('Z')
        .or_else(|| {
            raw.len()
                .checked_sub(6)
                .filter(|&i| i > 10 && raw.is_char_boundary(i))
                .and_then(|i| {
                    let (head, tail) = raw.split_at(i);
                    (tail.starts_with('+') || tail.starts_with('-')).then_some(head)
                })
        })
        .unwrap_or(raw);

    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(local, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(local, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Products
// =============================================================================

/// `FormaVenta` as returned by `/productos/obtener-formas-venta/{code}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUnitOfSale {
    #[serde(alias = "nombreFormaVenta", alias = "formaVenta")]
    pub nombre: String,
    #[serde(default)]
    pub precio_compra: f64,
    #[serde(alias = "precio")]
    pub precio_venta: f64,
    #[serde(default, alias = "cantidadDisponible", alias = "stock")]
    pub cantidad: f64,
    #[serde(default, alias = "cantidadMinima")]
    pub stock_minimo: f64,
    #[serde(default = "default_true")]
    pub activo: bool,
}

impl From<WireUnitOfSale> for UnitOfSale {
    fn from(w: WireUnitOfSale) -> Self {
        UnitOfSale {
            name: w.nombre.trim().to_string(),
            purchase_price: money_from_wire(w.precio_compra),
            sale_price: money_from_wire(w.precio_venta),
            available: stock_from_wire(w.cantidad),
            min_stock: stock_from_wire(w.stock_minimo),
            active: w.activo,
        }
    }
}

/// Row of `/productos/todos`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    #[serde(alias = "codigoProducto", alias = "codigoBarras")]
    pub codigo: String,
    #[serde(alias = "nombreProducto")]
    pub nombre: String,
    #[serde(default = "default_true")]
    pub activo: bool,
    #[serde(default, alias = "fechaRegistro")]
    pub fecha_creacion: Option<String>,
}

impl From<WireProduct> for ProductSummary {
    fn from(w: WireProduct) -> Self {
        ProductSummary {
            code: w.codigo.trim().to_string(),
            name: w.nombre.trim().to_string(),
            active: w.activo,
            created_at: w.fecha_creacion.as_deref().and_then(parse_timestamp),
        }
    }
}

// =============================================================================
// Clients
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireClient {
    #[serde(alias = "id", alias = "identificacion")]
    pub cedula: String,
    #[serde(alias = "nombreCliente")]
    pub nombre: String,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default, alias = "correo")]
    pub email: Option<String>,
}

impl From<WireClient> for Client {
    fn from(w: WireClient) -> Self {
        let non_blank = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        Client {
            id: w.cedula.trim().to_string(),
            name: w.nombre.trim().to_string(),
            address: w.direccion.unwrap_or_default(),
            phone: non_blank(w.telefono),
            email: non_blank(w.email),
        }
    }
}

// =============================================================================
// Movements
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMovement {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(alias = "monto")]
    pub valor: f64,
    pub tipo: String,
    #[serde(default, alias = "descripcion")]
    pub motivo: Option<String>,
    #[serde(default, alias = "fechaHora")]
    pub fecha: Option<String>,
}

impl WireMovement {
    /// Converts to a [`Movement`]; `None` for an unknown `tipo`.
    pub fn into_domain(self) -> Option<Movement> {
        let kind = match self.tipo.parse::<MovementKind>() {
            Ok(kind) => kind,
            Err(_) => {
                warn!(id = ?self.id, tipo = %self.tipo, "Skipping movement with unknown tipo");
                return None;
            }
        };

        Some(Movement {
            id: self.id,
            value: money_from_wire(self.valor),
            kind,
            reason: self.motivo.unwrap_or_default(),
            timestamp: self.fecha.as_deref().and_then(parse_timestamp),
        })
    }
}

/// Movements of a day; unknown kinds are skipped.
pub fn movements_from_wire(rows: Vec<WireMovement>) -> Vec<Movement> {
    rows.into_iter().filter_map(WireMovement::into_domain).collect()
}

// =============================================================================
// Cash registers
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireClosing {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, alias = "fechaHora", alias = "fechaCierre")]
    pub fecha: Option<String>,
    #[serde(alias = "saldo", alias = "valorCierre")]
    pub valor: f64,
}

impl From<WireClosing> for ClosingRecord {
    fn from(w: WireClosing) -> Self {
        ClosingRecord {
            id: w.id,
            timestamp: w.fecha.as_deref().and_then(parse_timestamp),
            value: money_from_wire(w.valor),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStatus {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(alias = "valor")]
    pub saldo: f64,
}

impl From<WireStatus> for CashRegisterStatus {
    fn from(w: WireStatus) -> Self {
        CashRegisterStatus {
            id: w.id,
            balance: money_from_wire(w.saldo),
        }
    }
}

/// A Spring-style page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePageBody<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

/// History endpoints answer either with a page or with a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WirePage<T> {
    List(Vec<T>),
    Paged(WirePageBody<T>),
}

impl<T> WirePage<T> {
    /// Normalizes to a [`Page`]; a bare array becomes the requested page.
    pub fn into_page<U: From<T>>(self, requested: u32, size: u32) -> Page<U> {
        match self {
            WirePage::Paged(body) => Page {
                content: body.content.into_iter().map(U::from).collect(),
                total_pages: body.total_pages,
                total_elements: body.total_elements,
                number: body.number,
                size: if body.size == 0 { size } else { body.size },
            },
            WirePage::List(rows) => {
                let total = rows.len() as u64;
                Page {
                    content: rows.into_iter().map(U::from).collect(),
                    total_pages: u32::from(total > 0),
                    total_elements: total,
                    number: requested,
                    size,
                }
            }
        }
    }
}

// =============================================================================
// Sales
// =============================================================================

/// Body of `POST /venta/guardar`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VentaPayload {
    pub cliente: String,
    pub usuario: i64,
    pub descuento: i64,
    pub dinero_recibido: i64,
    pub cambio: i64,
    pub detalles: Vec<DetallePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetallePayload {
    #[serde(rename = "codigoProducto")]
    pub codigo_producto: String,
    pub cantidad: f64,
    #[serde(rename = "nombreformaVenta")]
    pub nombre_forma_venta: String,
}

impl From<&SaleDraft> for VentaPayload {
    fn from(draft: &SaleDraft) -> Self {
        VentaPayload {
            cliente: draft.client_id.clone(),
            usuario: draft.user_id,
            descuento: draft.discount.pesos(),
            dinero_recibido: draft.tendered.pesos(),
            cambio: draft.change.pesos(),
            detalles: draft
                .lines
                .iter()
                .map(|line| DetallePayload {
                    codigo_producto: line.product_code.clone(),
                    cantidad: line.quantity.to_f64(),
                    nombre_forma_venta: line.unit_name.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSavedSale {
    #[serde(default, alias = "idVenta")]
    pub id: Option<i64>,
    #[serde(default, alias = "totalVenta")]
    pub total: Option<f64>,
}

impl From<WireSavedSale> for SavedSale {
    fn from(w: WireSavedSale) -> Self {
        SavedSale {
            id: w.id,
            total: w.total.map(money_from_wire),
        }
    }
}

/// The buyer of a sale: listings carry the cédula, details may embed the
/// whole client.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireClientRef {
    Cedula(String),
    Number(i64),
    Record(WireClient),
}

impl Default for WireClientRef {
    fn default() -> Self {
        WireClientRef::Cedula(String::new())
    }
}

impl WireClientRef {
    fn cedula(&self) -> String {
        match self {
            WireClientRef::Cedula(id) => id.trim().to_string(),
            WireClientRef::Number(id) => id.to_string(),
            WireClientRef::Record(client) => client.cedula.trim().to_string(),
        }
    }

    fn name(&self) -> Option<String> {
        match self {
            WireClientRef::Record(client) => Some(client.nombre.trim().to_string()),
            _ => None,
        }
    }
}

/// Row of `/venta/obtener-ventas-completadas`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSale {
    #[serde(alias = "idVenta")]
    pub id: i64,
    #[serde(default)]
    pub cliente: WireClientRef,
    #[serde(default, alias = "totalVenta")]
    pub total: f64,
    #[serde(default, alias = "fechaVenta")]
    pub fecha: Option<String>,
}

impl From<WireSale> for Sale {
    fn from(w: WireSale) -> Self {
        Sale {
            id: w.id,
            client: w.cliente.cedula(),
            total: money_from_wire(w.total),
            timestamp: w.fecha.as_deref().and_then(parse_timestamp),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSaleLine {
    #[serde(alias = "codigo")]
    pub codigo_producto: String,
    #[serde(default, alias = "nombre")]
    pub nombre_producto: String,
    #[serde(default, alias = "nombreformaVenta", alias = "formaVenta")]
    pub nombre_forma_venta: String,
    pub cantidad: f64,
    #[serde(default, alias = "precioUnitario", alias = "precioVenta")]
    pub precio: f64,
    #[serde(default)]
    pub subtotal: Option<f64>,
}

impl From<WireSaleLine> for SaleDetailLine {
    fn from(w: WireSaleLine) -> Self {
        let quantity = stock_from_wire(w.cantidad);
        let unit_price = money_from_wire(w.precio);
        let subtotal = match w.subtotal {
            Some(subtotal) => money_from_wire(subtotal),
            None => unit_price.multiply_quantity(quantity),
        };
        SaleDetailLine {
            product_code: w.codigo_producto.trim().to_string(),
            product_name: w.nombre_producto.trim().to_string(),
            unit_name: w.nombre_forma_venta.trim().to_string(),
            quantity,
            unit_price,
            subtotal,
        }
    }
}

/// Body of `GET /venta/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSaleDetail {
    #[serde(alias = "idVenta")]
    pub id: i64,
    #[serde(default)]
    pub cliente: WireClientRef,
    #[serde(default, alias = "fechaVenta")]
    pub fecha: Option<String>,
    #[serde(default)]
    pub descuento: f64,
    #[serde(default)]
    pub dinero_recibido: f64,
    #[serde(default)]
    pub cambio: f64,
    #[serde(default, alias = "totalVenta")]
    pub total: Option<f64>,
    #[serde(default, alias = "productos", alias = "detalleVenta")]
    pub detalles: Vec<WireSaleLine>,
}

impl From<WireSaleDetail> for SaleDetail {
    fn from(w: WireSaleDetail) -> Self {
        let lines: Vec<SaleDetailLine> = w.detalles.into_iter().map(SaleDetailLine::from).collect();
        let discount = money_from_wire(w.descuento);
        // older rows carry no total; rebuild it from the lines
        let total = match w.total {
            Some(total) => money_from_wire(total),
            None => {
                let gross: Money = lines.iter().map(|l| l.subtotal).sum();
                (gross - discount).max(Money::zero())
            }
        };
        SaleDetail {
            id: w.id,
            client: w.cliente.cedula(),
            client_name: w.cliente.name(),
            timestamp: w.fecha.as_deref().and_then(parse_timestamp),
            discount,
            tendered: money_from_wire(w.dinero_recibido),
            change: money_from_wire(w.cambio),
            total,
            lines,
        }
    }
}

// =============================================================================
// Electronic invoices
// =============================================================================

/// Body of `POST /efactura/guardar`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EFacturaPayload {
    pub id_venta: i64,
    pub fecha: String,
}

impl EFacturaPayload {
    pub fn new(sale_id: i64, at: NaiveDateTime) -> Self {
        EFacturaPayload {
            id_venta: sale_id,
            fecha: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// Row of `/efactura/obtener-efacturas`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEFactura {
    #[serde(alias = "idEFactura")]
    pub id: i64,
    #[serde(default)]
    pub id_venta: Option<i64>,
    #[serde(default)]
    pub cliente: WireClientRef,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub fecha: Option<String>,
}

impl From<WireEFactura> for ElectronicInvoice {
    fn from(w: WireEFactura) -> Self {
        ElectronicInvoice {
            id: w.id,
            sale_id: w.id_venta,
            client: w.cliente.cedula(),
            total: money_from_wire(w.total),
            timestamp: w.fecha.as_deref().and_then(parse_timestamp),
        }
    }
}
