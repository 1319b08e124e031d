//! # Result Aggregator
//!
//! Joins the line item tasks of one order and folds their results into a single
//! [`RealizedOrder`]. The join waits for every item, failed or not, so each robot the
//! factory finished has been picked up before the order is decided. The first failure to
//! arrive decides the outcome.

use super::FulfillmentError;
use crate::model::{Color, Customer, Order, RealizedOrder, Robot};
use tokio::task::JoinSet;
use tracing::warn;

pub struct ResultAggregator;

impl ResultAggregator {
    /// Waits for every item. Robots come back ordered by serial number; if any item
    /// failed, the first failure is returned once all items have resolved.
    pub async fn join_all(
        mut items: JoinSet<Result<Robot, FulfillmentError>>,
    ) -> Result<Vec<Robot>, FulfillmentError> {
        let mut robots = Vec::with_capacity(items.len());
        let mut first_failure = None;
        while let Some(joined) = items.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                Err(FulfillmentError::Aborted {
                    reason: e.to_string(),
                })
            });
            match outcome {
                Ok(robot) => robots.push(robot),
                Err(error) => {
                    warn!(%error, outstanding = items.len(), "Line item failed");
                    first_failure.get_or_insert(error);
                }
            }
        }
        if let Some(error) = first_failure {
            if !robots.is_empty() {
                warn!(collected = robots.len(), "Order failed after collecting robots");
            }
            return Err(error);
        }
        robots.sort_by_key(|r| r.serial_number);
        Ok(robots)
    }

    /// Checks that the robots are exactly the ones ordered, as a multiset of
    /// (robot type, color).
    pub fn check_robots(order: &Order, robots: &[Robot]) -> Result<(), FulfillmentError> {
        let mut wanted: Vec<(&str, Color)> = order
            .line_items
            .iter()
            .map(|item| (item.robot_type_id.as_str(), item.color))
            .collect();
        let mut got: Vec<(&str, Color)> = robots
            .iter()
            .map(|robot| (robot.robot_type_id.as_str(), robot.color))
            .collect();
        wanted.sort();
        got.sort();

        if wanted == got {
            Ok(())
        } else {
            Err(FulfillmentError::MismatchedRobots {
                reason: format!("ordered {wanted:?}, received {got:?}"),
            })
        }
    }

    pub fn realize(
        order: Order,
        outcome: Result<(Customer, Vec<Robot>), FulfillmentError>,
    ) -> RealizedOrder {
        match outcome {
            Ok((customer, robots)) => RealizedOrder::success(order, customer, robots),
            Err(error) => RealizedOrder::failure(order, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomerId, LineItem, OrderId, SerialNumber};
    use std::time::Duration;

    fn robot(serial: u64, robot_type_id: &str, color: Color) -> Robot {
        Robot {
            serial_number: SerialNumber(serial),
            robot_type_id: robot_type_id.into(),
            color,
        }
    }

    fn order(items: Vec<LineItem>) -> Order {
        Order {
            order_id: OrderId(3),
            customer_id: CustomerId(1),
            placement_time: chrono::Utc::now(),
            line_items: items,
        }
    }

    #[test]
    fn robots_must_match_the_order_as_a_multiset() {
        let order = order(vec![
            LineItem::new("BB-8", Color::Blue),
            LineItem::new("BB-8", Color::Blue),
            LineItem::new("EVE", Color::White),
        ]);

        let delivered = [
            robot(9, "EVE", Color::White),
            robot(7, "BB-8", Color::Blue),
            robot(8, "BB-8", Color::Blue),
        ];
        assert!(ResultAggregator::check_robots(&order, &delivered).is_ok());

        let short = [robot(7, "BB-8", Color::Blue), robot(9, "EVE", Color::White)];
        assert!(ResultAggregator::check_robots(&order, &short).is_err());

        let wrong_color = [
            robot(7, "BB-8", Color::Blue),
            robot(8, "BB-8", Color::Red),
            robot(9, "EVE", Color::White),
        ];
        assert!(matches!(
            ResultAggregator::check_robots(&order, &wrong_color),
            Err(FulfillmentError::MismatchedRobots { .. })
        ));
    }

    #[tokio::test]
    async fn failure_waits_for_every_sibling() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut items = JoinSet::new();
        items.spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
            Ok(robot(1, "EVE", Color::Green))
        });
        items.spawn(async {
            Err(FulfillmentError::Timeout {
                waiting_for: "robot 2".into(),
            })
        });

        let err = ResultAggregator::join_all(items).await.unwrap_err();
        assert_eq!(
            err,
            FulfillmentError::Timeout {
                waiting_for: "robot 2".into()
            }
        );
        // The slower sibling ran to completion before the join returned.
        assert_eq!(rx.await, Ok(()));
    }

    #[tokio::test]
    async fn first_failure_to_arrive_wins() {
        let mut items = JoinSet::new();
        items.spawn(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(FulfillmentError::Timeout {
                waiting_for: "robot 1".into(),
            })
        });
        items.spawn(async {
            Err(FulfillmentError::FactoryOverloaded {
                robot_type_id: "EVE".into(),
                color: Color::Green,
            })
        });

        let err = ResultAggregator::join_all(items).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::FactoryOverloaded { .. }));
    }

    #[tokio::test]
    async fn join_all_collects_every_robot() {
        let mut items = JoinSet::new();
        for serial in [3, 1, 2] {
            items.spawn(async move { Ok(robot(serial, "R2-D2", Color::Blue)) });
        }
        let robots = ResultAggregator::join_all(items).await.unwrap();
        let serials: Vec<u64> = robots.iter().map(|r| r.serial_number.0).collect();
        assert_eq!(serials, vec![1, 2, 3]);
    }

    #[test]
    fn realize_picks_the_shape_from_the_outcome() {
        let order = order(vec![]);
        let failed = ResultAggregator::realize(
            order.clone(),
            Err(FulfillmentError::CustomerNotFound {
                customer_id: CustomerId(1),
            }),
        );
        assert!(failed.customer.is_none());
        assert!(failed.robots.is_none());
        assert!(!failed.is_success());
    }
}
