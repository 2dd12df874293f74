use super::ports::{FoodTruckRepository, StoreLocationRepository};
use super::types::{Origin, OriginClass, OriginReference, ResolutionState};
use crate::config::OriginConfig;
use crate::domains::logger::DynLogger;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

pub type StateObserver = Arc<dyn Fn(&ResolutionState) + Send + Sync>;

struct ResolverInner {
    state: ResolutionState,
    current: Option<Origin>,
    settled: HashMap<String, ResolutionState>,
    in_flight: HashSet<String>,
    latest_request: Option<String>,
}

enum Lookup {
    FoodTruck(String),
    StoreLocation(String),
}

/// Resolves a route origin once per identifier per screen.
///
/// Concurrent callers share one lookup: a second `resolve` for an identifier
/// in flight returns `Resolving` instead of issuing I/O, and an identifier
/// that already settled answers with its own recorded outcome. Only the most
/// recently requested reference may settle the visible state.
pub struct OriginResolver {
    food_trucks: Arc<dyn FoodTruckRepository>,
    store_locations: Arc<dyn StoreLocationRepository>,
    logger: DynLogger,
    config: OriginConfig,
    inner: Mutex<ResolverInner>,
    observer: Option<StateObserver>,
}

impl OriginResolver {
    pub fn new(
        food_trucks: Arc<dyn FoodTruckRepository>,
        store_locations: Arc<dyn StoreLocationRepository>,
        logger: DynLogger,
        config: OriginConfig,
    ) -> Self {
        Self {
            food_trucks,
            store_locations,
            logger,
            config,
            inner: Mutex::new(ResolverInner {
                state: ResolutionState::Idle,
                current: None,
                settled: HashMap::new(),
                in_flight: HashSet::new(),
                latest_request: None,
            }),
            observer: None,
        }
    }

    /// Origin known before any reference is supplied, e.g. the order's pickup place.
    pub fn with_initial(self, origin: Origin) -> Self {
        self.lock().current = Some(origin);
        self
    }

    pub fn with_observer(mut self, observer: impl Fn(&ResolutionState) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn state(&self) -> ResolutionState {
        self.lock().state.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.lock().state.is_ready()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().state.shows_loading_overlay()
    }

    pub fn origin(&self) -> Option<Origin> {
        self.lock().current.clone()
    }

    pub async fn resolve(&self, reference: Option<OriginReference>) -> ResolutionState {
        let (lookup, resolving) = {
            let mut inner = self.lock();
            match self.begin(&mut inner, reference) {
                Ok(settled) => {
                    drop(inner);
                    return self.publish(settled);
                }
                Err(lookup) => (lookup, inner.state.clone()),
            }
        };
        self.notify(&resolving);

        let (identifier, result) = match lookup {
            Lookup::FoodTruck(id) => {
                let result = self.food_trucks.find_food_truck(&id).await;
                (id, result)
            }
            Lookup::StoreLocation(id) => {
                let result = self.store_locations.find_store_location(&id).await;
                (id, result)
            }
        };

        let outcome = match result {
            Ok(origin) => ResolutionState::Ready(origin),
            Err(e) => {
                self.logger
                    .error(&format!("Error fetching origin {}: {}", identifier, e));
                ResolutionState::Failed {
                    identifier: identifier.clone(),
                    reason: e.to_string(),
                }
            }
        };

        let settled = {
            let mut inner = self.lock();
            inner.in_flight.remove(&identifier);
            inner.settled.insert(identifier.clone(), outcome.clone());
            if inner.latest_request.as_deref() != Some(identifier.as_str()) {
                // superseded by a newer reference; keep its outcome
                return inner.state.clone();
            }
            Self::show(&mut inner, outcome)
        };
        self.notify(&settled);
        settled
    }

    /// Settles without I/O when possible, otherwise names the lookup to run.
    fn begin(&self, inner: &mut ResolverInner, reference: Option<OriginReference>) -> Result<ResolutionState, Lookup> {
        let identifier = match reference {
            None => {
                inner.latest_request = None;
                inner.state = match &inner.current {
                    Some(origin) => ResolutionState::Ready(origin.clone()),
                    None => ResolutionState::Failed {
                        identifier: String::new(),
                        reason: "no origin supplied".to_string(),
                    },
                };
                return Ok(inner.state.clone());
            }
            Some(OriginReference::Resolved(origin)) => {
                inner.latest_request = None;
                let origin = match inner.current.take() {
                    Some(current) if current.id == origin.id => current,
                    _ => origin,
                };
                return Ok(Self::show(inner, ResolutionState::Ready(origin)));
            }
            Some(OriginReference::Identifier(identifier)) => identifier,
        };
        inner.latest_request = Some(identifier.clone());

        if let Some(current) = inner.current.as_ref().filter(|c| c.matches(&identifier)) {
            inner.state = ResolutionState::Ready(current.clone());
            return Ok(inner.state.clone());
        }

        if let Some(outcome) = inner.settled.get(&identifier).cloned() {
            return Ok(Self::show(inner, outcome));
        }

        if inner.in_flight.contains(&identifier) {
            inner.state = ResolutionState::Resolving { identifier };
            return Ok(inner.state.clone());
        }

        let lookup = match OriginClass::classify(&identifier, &self.config) {
            OriginClass::FoodTruck => match self.food_trucks.cached(&identifier) {
                Some(cached) => {
                    let outcome = ResolutionState::Ready(cached);
                    inner.settled.insert(identifier, outcome.clone());
                    return Ok(Self::show(inner, outcome));
                }
                None => Lookup::FoodTruck(identifier.clone()),
            },
            OriginClass::StoreLocation => Lookup::StoreLocation(identifier.clone()),
            OriginClass::Unknown => {
                self.logger
                    .warn(&format!("Unrecognized origin identifier {}", identifier));
                let outcome = ResolutionState::Failed {
                    identifier: identifier.clone(),
                    reason: "unrecognized origin identifier".to_string(),
                };
                inner.settled.insert(identifier, outcome.clone());
                return Ok(Self::show(inner, outcome));
            }
        };

        inner.in_flight.insert(identifier.clone());
        inner.state = ResolutionState::Resolving { identifier };
        Err(lookup)
    }

    /// Makes `outcome` the visible state and its origin, if any, the current one.
    fn show(inner: &mut ResolverInner, outcome: ResolutionState) -> ResolutionState {
        match &outcome {
            ResolutionState::Ready(origin) => inner.current = Some(origin.clone()),
            ResolutionState::Failed { .. } => inner.current = None,
            _ => {}
        }
        inner.state = outcome;
        inner.state.clone()
    }

    fn publish(&self, state: ResolutionState) -> ResolutionState {
        self.notify(&state);
        state
    }

    fn notify(&self, state: &ResolutionState) {
        if let Some(observer) = &self.observer {
            observer(state);
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResolverInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
