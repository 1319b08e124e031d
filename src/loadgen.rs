//! # Load Generator
//!
//! Drives a running shop over HTTP: registers random customers, places random orders
//! against the order service and polls each order until it can be picked up. Every call
//! carries a `traceparent` from one root trace per order, so a whole run shows up as
//! connected traces.

use crate::clients::{http_client, HttpCustomerClient, LookupError};
use crate::model::{
    Color, Customer, CustomerCreate, LineItem, Order, OrderRequest, Paint, RealizedOrder,
    RobotType,
};
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::StatusCode;
use shop_kernel::{CorrelationContext, TRACEPARENT_HEADER};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};

const FIRST_NAMES: [&str; 8] = [
    "Ada", "Alan", "Grace", "Edsger", "Barbara", "Donald", "Frances", "Ken",
];
const LAST_NAMES: [&str; 8] = [
    "Lovelace", "Turing", "Hopper", "Dijkstra", "Liskov", "Knuth", "Allen", "Thompson",
];
const COUNTRY_CODES: [u32; 8] = [1, 30, 33, 41, 44, 46, 47, 49];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Could not register customer: {0}")]
    Customer(#[from] LookupError),
    #[error("The factory offers no robot types")]
    NoRobotTypes,
    #[error("The factory offers no paints")]
    NoPaints,
    #[error("The customer service registered none of the customers")]
    NoCustomers,
    #[error("Invalid load settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct LoadSettings {
    pub customers: usize,
    pub orders: usize,
    pub customer_service: String,
    pub factory_service: String,
    pub order_service: String,
    pub min_robots: usize,
    pub max_robots: usize,
    pub poll_interval: Duration,
    /// How long one order may take from placement to pickup.
    pub deadline: Duration,
    pub request_timeout: Duration,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            customers: 5,
            orders: 20,
            customer_service: "http://localhost:8081".into(),
            factory_service: "http://localhost:8082".into(),
            order_service: "http://localhost:8080".into(),
            min_robots: 2,
            max_robots: 10,
            poll_interval: Duration::from_millis(500),
            deadline: Duration::from_secs(120),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome counts of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    /// Orders the order service refused to accept.
    pub rejected: usize,
}

impl LoadReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.timed_out + self.rejected
    }

    fn record(&mut self, outcome: OrderOutcome) {
        match outcome {
            OrderOutcome::Succeeded => self.succeeded += 1,
            OrderOutcome::Failed => self.failed += 1,
            OrderOutcome::TimedOut => self.timed_out += 1,
            OrderOutcome::Rejected => self.rejected += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderOutcome {
    Succeeded,
    Failed,
    TimedOut,
    Rejected,
}

pub async fn run(settings: &LoadSettings) -> Result<LoadReport, LoadError> {
    if settings.customers == 0 || settings.min_robots == 0 || settings.min_robots > settings.max_robots {
        return Err(LoadError::Invalid(
            "need at least one customer and 1 <= min_robots <= max_robots".into(),
        ));
    }
    let http = http_client(settings.request_timeout)?;
    let customer_service = HttpCustomerClient::new(http.clone(), &settings.customer_service);
    let setup = CorrelationContext::new_root();

    let factory = settings.factory_service.trim_end_matches('/');
    let robot_types: Vec<RobotType> = http
        .get(format!("{factory}/robottypes/"))
        .header(TRACEPARENT_HEADER, setup.child().to_traceparent())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    if robot_types.is_empty() {
        return Err(LoadError::NoRobotTypes);
    }
    let robot_type_ids: Vec<String> = robot_types.into_iter().map(|t| t.robot_type_id).collect();

    let paints: Vec<Paint> = http
        .get(format!("{factory}/paints/"))
        .header(TRACEPARENT_HEADER, setup.child().to_traceparent())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    if paints.is_empty() {
        return Err(LoadError::NoPaints);
    }
    let colors: Vec<Color> = paints.into_iter().map(|p| p.color).collect();

    let batch: Vec<CustomerCreate> = (0..settings.customers).map(|_| random_customer()).collect();
    let customers = customer_service.register_batch(&batch, &setup).await?;
    if customers.is_empty() {
        return Err(LoadError::NoCustomers);
    }
    for customer in &customers {
        info!(customer_id = %customer.customer_id, name = %customer.full_name, "Registered customer");
    }

    let order_service = settings.order_service.trim_end_matches('/').to_string();
    let mut orders = JoinSet::new();
    for index in 0..settings.orders {
        let customer = customers[index % customers.len()].clone();
        let line_items = random_line_items(
            &robot_type_ids,
            &colors,
            settings.min_robots,
            settings.max_robots,
        );
        let worker = OrderWorker {
            http: http.clone(),
            order_service: order_service.clone(),
            poll_interval: settings.poll_interval,
            deadline: settings.deadline,
        };
        let ctx = CorrelationContext::new_root();
        let span = info_span!("load_order", index, customer_id = %customer.customer_id, trace_id = %ctx.trace_id());
        orders.spawn(async move { worker.place_and_collect(&customer, line_items, &ctx).await }.instrument(span));
    }

    let mut report = LoadReport::default();
    while let Some(outcome) = orders.join_next().await {
        match outcome {
            Ok(outcome) => report.record(outcome),
            Err(e) => {
                warn!(error = %e, "Order worker died");
                report.record(OrderOutcome::Failed);
            }
        }
    }

    for customer in &customers {
        if let Err(e) = customer_service.remove(customer.customer_id, &setup).await {
            warn!(customer_id = %customer.customer_id, error = %e, "Could not remove customer");
        }
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        timed_out = report.timed_out,
        rejected = report.rejected,
        "Load run finished"
    );
    Ok(report)
}

struct OrderWorker {
    http: reqwest::Client,
    order_service: String,
    poll_interval: Duration,
    deadline: Duration,
}

impl OrderWorker {
    async fn place_and_collect(
        &self,
        customer: &Customer,
        line_items: Vec<LineItem>,
        ctx: &CorrelationContext,
    ) -> OrderOutcome {
        let request = OrderRequest {
            customer_id: Some(customer.customer_id),
            line_items,
        };
        let response = self
            .http
            .post(format!("{}/orders/new", self.order_service))
            .header(TRACEPARENT_HEADER, ctx.child().to_traceparent())
            .json(&request)
            .send()
            .await;
        let order: Order = match response {
            Ok(response) if response.status() == StatusCode::ACCEPTED => match response.json().await {
                Ok(order) => order,
                Err(e) => {
                    warn!(error = %e, "Unreadable order");
                    return OrderOutcome::Failed;
                }
            },
            Ok(response) => {
                warn!(status = %response.status(), "Order refused");
                return OrderOutcome::Rejected;
            }
            Err(e) => {
                warn!(error = %e, "Could not place order");
                return OrderOutcome::Rejected;
            }
        };
        info!(order_id = %order.order_id, robots = order.line_items.len(), "Order placed");

        let started = Instant::now();
        while started.elapsed() < self.deadline {
            tokio::time::sleep(self.poll_interval).await;
            let response = self
                .http
                .get(format!("{}/orders/pickup", self.order_service))
                .query(&[("orderId", order.order_id.to_string())])
                .header(TRACEPARENT_HEADER, ctx.child().to_traceparent())
                .send()
                .await;
            match response {
                Ok(response) if response.status() == StatusCode::OK => {
                    return match response.json::<RealizedOrder>().await {
                        Ok(realized) if realized.is_success() => {
                            info!(order_id = %order.order_id, "Order picked up");
                            OrderOutcome::Succeeded
                        }
                        Ok(realized) => {
                            let reason = realized.error.map(|e| e.to_string()).unwrap_or_default();
                            warn!(order_id = %order.order_id, %reason, "Order failed");
                            OrderOutcome::Failed
                        }
                        Err(e) => {
                            warn!(error = %e, "Unreadable realized order");
                            OrderOutcome::Failed
                        }
                    };
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Pickup poll failed"),
            }
        }
        warn!(order_id = %order.order_id, "Gave up waiting for order");
        OrderOutcome::TimedOut
    }
}

fn random_customer() -> CustomerCreate {
    let mut rng = rand::thread_rng();
    let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Ada");
    let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Lovelace");
    let country = COUNTRY_CODES.choose(&mut rng).copied().unwrap_or(1);
    CustomerCreate {
        full_name: format!("{first} {last}"),
        phone_number: format!(
            "+{country}-(0)7{}-{} {} {}",
            rng.gen_range(0..10),
            rng.gen_range(100..1000),
            rng.gen_range(10..100),
            rng.gen_range(10..100)
        ),
    }
}

fn random_line_items(
    robot_type_ids: &[String],
    colors: &[Color],
    min: usize,
    max: usize,
) -> Vec<LineItem> {
    let mut rng = rand::thread_rng();
    let count = rng.gen_range(min..=max);
    (0..count)
        .filter_map(|_| {
            let robot_type_id = robot_type_ids.choose(&mut rng)?;
            let color = colors.choose(&mut rng)?;
            Some(LineItem::new(robot_type_id.clone(), *color))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_customers_pass_validation() {
        for _ in 0..50 {
            let create = random_customer();
            Customer::validate(&create.full_name, &create.phone_number).unwrap();
        }
    }

    #[test]
    fn random_orders_respect_the_size_bounds() {
        let types: Vec<String> = vec!["EVE".into(), "BB-8".into()];
        for _ in 0..50 {
            let items = random_line_items(&types, &[Color::Cyan, Color::Pink], 2, 4);
            assert!((2..=4).contains(&items.len()));
            assert!(items.iter().all(|i| types.contains(&i.robot_type_id)));
            assert!(items.iter().all(|i| matches!(i.color, Color::Cyan | Color::Pink)));
        }
    }

    #[tokio::test]
    async fn rejects_inverted_robot_bounds() {
        let settings = LoadSettings {
            min_robots: 5,
            max_robots: 2,
            ..LoadSettings::default()
        };
        assert!(matches!(run(&settings).await, Err(LoadError::Invalid(_))));
    }
}
