//! Order domain types and report filters.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use cupcake_core::{
    CupcakeId, LineAmount, OrderId, OrderStatus, Price, Rating, UserId, order_total,
};

/// Display format for order timestamps.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// An order header joined with its owner's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_name: String,
    pub customer_email: String,
    pub finalized: bool,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub rating: Option<Rating>,
}

impl Order {
    /// Creation timestamp as `dd/mm/yyyy HH:MM`.
    #[must_use]
    pub fn created_display(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Whether the owner may still rate this order.
    #[must_use]
    pub fn can_be_rated(&self) -> bool {
        self.status.accepts_rating() && self.rating.is_none()
    }
}

/// One order line priced at the current catalog price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub cupcake_id: CupcakeId,
    pub cupcake_name: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl OrderLine {
    /// Quantity and price for total arithmetic.
    #[must_use]
    pub const fn amount(&self) -> LineAmount {
        LineAmount::new(self.quantity, self.unit_price)
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.amount().subtotal()
    }
}

/// An order with its computed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub order: Order,
    pub total: Price,
}

/// One entry of the status history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLogEntry {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
}

impl StatusLogEntry {
    /// Timestamp as `dd/mm/yyyy HH:MM`.
    #[must_use]
    pub fn at_display(&self) -> String {
        self.at.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// An order with lines, total and status history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub total: Price,
    pub history: Vec<StatusLogEntry>,
}

impl OrderDetail {
    /// Assemble a detail view, computing the total from the lines.
    #[must_use]
    pub fn new(order: Order, lines: Vec<OrderLine>, history: Vec<StatusLogEntry>) -> Self {
        let total = order_total(lines.iter().map(OrderLine::amount));
        Self {
            order,
            lines,
            total,
            history,
        }
    }
}

/// Raw report filter query string, as submitted by the dashboard form.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReportQuery {
    pub status: Option<String>,
    pub cliente: Option<String>,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
}

/// Parsed report filter shared by the dashboard and both exports.
///
/// Empty fields are absent. Dates that do not parse as `YYYY-MM-DD` are
/// ignored rather than rejected.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    /// Exact status label to match.
    pub status: Option<String>,
    /// Case-insensitive substring of the customer name.
    pub customer: Option<String>,
    /// First day included.
    pub from: Option<NaiveDate>,
    /// Last day included.
    pub to: Option<NaiveDate>,
}

impl ReportFilter {
    /// Parse the query string fields.
    #[must_use]
    pub fn from_query(query: &ReportQuery) -> Self {
        Self {
            status: non_empty(query.status.as_deref()),
            customer: non_empty(query.cliente.as_deref()),
            from: parse_date(query.data_inicio.as_deref()),
            to: parse_date(query.data_fim.as_deref()),
        }
    }

    /// Lower bound on `data_pedido`, inclusive.
    #[must_use]
    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.from.map(|day| day.and_time(NaiveTime::MIN).and_utc())
    }

    /// Upper bound on `data_pedido`, exclusive: midnight after the last day.
    #[must_use]
    pub fn created_before(&self) -> Option<DateTime<Utc>> {
        self.to
            .and_then(|day| day.checked_add_days(Days::new(1)))
            .map(|day| day.and_time(NaiveTime::MIN).and_utc())
    }

    /// Whether no filter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.customer.is_none() && self.from.is_none() && self.to.is_none()
    }

    /// Query string that reproduces this filter, without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(status) = &self.status {
            pairs.push(format!("status={}", urlencoding::encode(status)));
        }
        if let Some(customer) = &self.customer {
            pairs.push(format!("cliente={}", urlencoding::encode(customer)));
        }
        if let Some(from) = self.from {
            pairs.push(format!("data_inicio={from}"));
        }
        if let Some(to) = self.to {
            pairs.push(format!("data_fim={to}"));
        }
        pairs.join("&")
    }

    /// Form value helpers for templates.
    #[must_use]
    pub fn status_value(&self) -> &str {
        self.status.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn customer_value(&self) -> &str {
        self.customer.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn from_value(&self) -> String {
        self.from.map(|d| d.to_string()).unwrap_or_default()
    }

    #[must_use]
    pub fn to_value(&self) -> String {
        self.to.map(|d| d.to_string()).unwrap_or_default()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty())?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Ignoring invalid report date");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn query(status: &str, cliente: &str, inicio: &str, fim: &str) -> ReportQuery {
        ReportQuery {
            status: Some(status.to_string()),
            cliente: Some(cliente.to_string()),
            data_inicio: Some(inicio.to_string()),
            data_fim: Some(fim.to_string()),
        }
    }

    #[test]
    fn test_empty_fields_are_absent() {
        let filter = ReportFilter::from_query(&query("", "  ", "", ""));
        assert!(filter.is_empty());
        assert_eq!(filter.query_string(), "");
    }

    #[test]
    fn test_invalid_dates_are_ignored() {
        let filter = ReportFilter::from_query(&query("Pronto", "", "31/12/2024", "2024-02-30"));
        assert_eq!(filter.status.as_deref(), Some("Pronto"));
        assert_eq!(filter.from, None);
        assert_eq!(filter.to, None);
    }

    #[test]
    fn test_date_range_is_inclusive_of_last_day() {
        let filter = ReportFilter::from_query(&query("", "", "2024-03-01", "2024-03-31"));
        assert_eq!(
            filter.created_from().unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            filter.created_before().unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_query_string_round_trips_filters() {
        let filter = ReportFilter::from_query(&query("Em produção", "Ana Maria", "2024-01-01", ""));
        assert_eq!(
            filter.query_string(),
            "status=Em%20produ%C3%A7%C3%A3o&cliente=Ana%20Maria&data_inicio=2024-01-01"
        );
    }

    #[test]
    fn test_detail_total_matches_fixture() {
        let order = Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            customer_name: "Ana".to_string(),
            customer_email: "ana@example.com".to_string(),
            finalized: true,
            status: OrderStatus::Recebido,
            created_at: Utc.with_ymd_and_hms(2024, 5, 4, 15, 30, 0).unwrap(),
            rating: None,
        };
        let lines = vec![
            OrderLine {
                cupcake_id: CupcakeId::new(1),
                cupcake_name: "Baunilha".to_string(),
                quantity: 3,
                unit_price: Price::from_cents(500),
            },
            OrderLine {
                cupcake_id: CupcakeId::new(2),
                cupcake_name: "Pistache".to_string(),
                quantity: 1,
                unit_price: Price::from_cents(1250),
            },
        ];
        let detail = OrderDetail::new(order, lines, Vec::new());
        assert_eq!(detail.total, Price::from_cents(2750));
        assert_eq!(detail.order.created_display(), "04/05/2024 15:30");
        assert!(!detail.order.can_be_rated());
    }
}
