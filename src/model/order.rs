use super::customer::Customer;
use super::ids::{CustomerId, OrderId};
use super::robot::{Color, Robot};
use crate::order_actor::FulfillmentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One (robot type, color) request within an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub robot_type_id: String,
    pub color: Color,
}

impl LineItem {
    pub fn new(robot_type_id: impl Into<String>, color: Color) -> Self {
        Self {
            robot_type_id: robot_type_id.into(),
            color,
        }
    }
}

/// A placed order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub placement_time: DateTime<Utc>,
    pub line_items: Vec<LineItem>,
}

/// Body of `POST /orders/new`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// The terminal record of an order's fulfillment.
///
/// Exactly one of two shapes: `customer` and `robots` set with no `error`, or only `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedOrder {
    pub order: Order,
    pub customer: Option<Customer>,
    pub robots: Option<Vec<Robot>>,
    #[serde(default, with = "error_body")]
    pub error: Option<FulfillmentError>,
}

/// Writes a fulfillment error as `{kind, message, ...details}`.
mod error_body {
    use crate::order_actor::FulfillmentError;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct Body<'a> {
        #[serde(flatten)]
        error: &'a FulfillmentError,
        message: String,
    }

    #[derive(Deserialize)]
    struct Owned {
        #[serde(flatten)]
        error: FulfillmentError,
    }

    pub fn serialize<S: Serializer>(
        error: &Option<FulfillmentError>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        error
            .as_ref()
            .map(|error| Body {
                error,
                message: error.to_string(),
            })
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<FulfillmentError>, D::Error> {
        Ok(Option::<Owned>::deserialize(deserializer)?.map(|owned| owned.error))
    }
}

impl RealizedOrder {
    pub fn success(order: Order, customer: Customer, robots: Vec<Robot>) -> Self {
        Self {
            order,
            customer: Some(customer),
            robots: Some(robots),
            error: None,
        }
    }

    pub fn failure(order: Order, error: FulfillmentError) -> Self {
        Self {
            order,
            customer: None,
            robots: None,
            error: Some(error),
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order.order_id
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
