use crate::clients::{http_client, CustomerClient, HttpCustomerClient, HttpFactoryGateway};
use crate::config::{FactoryConfig, OrderServiceConfig, ShopConfig};
use crate::factory::{ProductionScheduler, RobotCatalog};
use crate::http;
use crate::order_actor::OrderOrchestrator;
use axum::Router;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

const STORE_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// One of the three services of the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Customers,
    Factory,
    Orders,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Service::Customers => "customers",
            Service::Factory => "factory",
            Service::Orders => "orders",
        })
    }
}

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("Store task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
    #[error("Stores still running after {0:?}; a client outlived the system")]
    TimedOut(Duration),
}

/// Starts the stores each service depends on and wires the services together.
///
/// A system holds any subset of the three services. Services built by one system talk to
/// each other in-process; a standalone order service reaches its collaborators over HTTP.
pub struct ShopSystem {
    customers: Option<CustomerClient>,
    factory: Option<Arc<ProductionScheduler>>,
    orders: Option<Arc<OrderOrchestrator>>,
    handles: Vec<JoinHandle<()>>,
}

impl ShopSystem {
    /// All three services in one process, calling each other directly.
    pub fn in_process(config: &ShopConfig) -> Self {
        let mut system = Self::empty();
        let customers = system.start_customers();
        let factory = system.start_factory(&config.factory);
        system.start_orders(&config.orders, Arc::new(customers), factory);
        system
    }

    pub fn customer_service() -> Self {
        let mut system = Self::empty();
        system.start_customers();
        system
    }

    pub fn factory_service(config: &FactoryConfig) -> Self {
        let mut system = Self::empty();
        system.start_factory(config);
        system
    }

    /// The order service alone, reaching the customer and factory services at the
    /// configured URLs.
    pub fn order_service(config: &OrderServiceConfig) -> Result<Self, reqwest::Error> {
        let http = http_client(config.request_timeout())?;
        let customers = HttpCustomerClient::new(http.clone(), &config.customer_service_url);
        let factory = HttpFactoryGateway::new(http, &config.factory_service_url);
        info!(
            customers = %config.customer_service_url,
            factory = %config.factory_service_url,
            "Order service collaborators"
        );

        let mut system = Self::empty();
        system.start_orders(config, Arc::new(customers), Arc::new(factory));
        Ok(system)
    }

    fn empty() -> Self {
        Self {
            customers: None,
            factory: None,
            orders: None,
            handles: Vec::new(),
        }
    }

    fn start_customers(&mut self) -> CustomerClient {
        let (store, customers) = crate::customer_actor::new();
        self.handles.push(tokio::spawn(store.run(())));
        self.customers = Some(customers.clone());
        customers
    }

    fn start_factory(&mut self, config: &FactoryConfig) -> Arc<ProductionScheduler> {
        let (store, scheduler) = ProductionScheduler::new(config, RobotCatalog::default());
        self.handles.push(tokio::spawn(store.run(())));
        let scheduler = Arc::new(scheduler);
        self.factory = Some(Arc::clone(&scheduler));
        scheduler
    }

    fn start_orders(
        &mut self,
        config: &OrderServiceConfig,
        customers: Arc<dyn crate::clients::CustomerDirectory>,
        factory: Arc<dyn crate::clients::FactoryGateway>,
    ) {
        let (ledger, orchestrator) = OrderOrchestrator::new(config, customers, factory);
        self.handles.push(tokio::spawn(ledger.run(())));
        self.orders = Some(Arc::new(orchestrator));
    }

    pub fn customers(&self) -> Option<&CustomerClient> {
        self.customers.as_ref()
    }

    pub fn factory(&self) -> Option<&Arc<ProductionScheduler>> {
        self.factory.as_ref()
    }

    pub fn orders(&self) -> Option<&Arc<OrderOrchestrator>> {
        self.orders.as_ref()
    }

    /// The HTTP router of every service this system runs.
    pub fn routers(&self) -> Vec<(Service, Router)> {
        let mut routers = Vec::new();
        if let Some(customers) = &self.customers {
            routers.push((Service::Customers, http::customers::router(customers.clone())));
        }
        if let Some(factory) = &self.factory {
            routers.push((Service::Factory, http::factory::router(Arc::clone(factory))));
        }
        if let Some(orders) = &self.orders {
            routers.push((Service::Orders, http::orders::router(Arc::clone(orders))));
        }
        routers
    }

    /// Drains the worker pools, then closes every store.
    ///
    /// Routers built from this system must be dropped first, or their stores stay open
    /// and this fails with `TimedOut`.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        info!("Shutting down");
        if let Some(orders) = &self.orders {
            orders.shutdown().await;
        }
        if let Some(factory) = &self.factory {
            factory.shutdown().await;
        }

        drop(self.orders);
        drop(self.factory);
        drop(self.customers);

        let drained = tokio::time::timeout(STORE_DRAIN_TIMEOUT, async {
            for handle in self.handles {
                handle.await?;
            }
            Ok::<(), ShutdownError>(())
        })
        .await;
        match drained {
            Ok(result) => {
                result?;
                info!("Shutdown complete");
                Ok(())
            }
            Err(_) => {
                error!("Stores did not close");
                Err(ShutdownError::TimedOut(STORE_DRAIN_TIMEOUT))
            }
        }
    }
}
