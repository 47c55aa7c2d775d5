//! Evaluation of material property providers in dependency order.
use crate::interface::DerivativeMaterialInterface;
use crate::registry::MaterialPropertyRegistry;
use crate::value::Real;
use eyre::{eyre, WrapErr};
use itertools::Itertools;
use log::debug;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Values of field variables at the quadrature points of the current element.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    n_qp: usize,
    fields: FxHashMap<String, Vec<Real>>,
}

impl EvaluationContext {
    pub fn new(n_qp: usize) -> Self {
        Self {
            n_qp,
            fields: FxHashMap::default(),
        }
    }

    pub fn n_qp(&self) -> usize {
        self.n_qp
    }

    /// Sets the values of a field variable, one per quadrature point.
    pub fn set_field(&mut self, name: impl Into<String>, values: Vec<Real>) -> eyre::Result<()> {
        let name = name.into();
        if values.len() != self.n_qp {
            return Err(eyre!(
                "Field '{}' has {} values, but the context has {} quadrature points",
                name,
                values.len(),
                self.n_qp
            ));
        }
        self.fields.insert(name, values);
        Ok(())
    }

    pub fn with_field(mut self, name: impl Into<String>, values: Vec<Real>) -> eyre::Result<Self> {
        self.set_field(name, values)?;
        Ok(self)
    }

    /// Sets a field variable to the same value at every quadrature point.
    pub fn with_uniform_field(self, name: impl Into<String>, value: Real) -> Self {
        let n_qp = self.n_qp;
        let mut context = self;
        context.fields.insert(name.into(), vec![value; n_qp]);
        context
    }

    pub fn field(&self, name: &str) -> eyre::Result<&[Real]> {
        self.fields
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| eyre!("No values for field variable '{}' in evaluation context", name))
    }
}

/// An object that computes material properties at quadrature points.
pub trait PropertyProvider {
    /// The property interface of this object.
    fn interface(&self) -> &DerivativeMaterialInterface;

    fn name(&self) -> &str {
        self.interface().name()
    }

    /// Names of the properties this provider writes.
    fn declared_properties(&self) -> Vec<String> {
        self.interface().declared_property_names()
    }

    /// Names of the properties this provider reads.
    fn consumed_properties(&self) -> Vec<String> {
        self.interface().consumed_property_names()
    }

    /// Called once after all objects are constructed, before the first evaluation.
    fn initial_setup(&mut self) -> eyre::Result<()> {
        Ok(())
    }

    /// Computes the declared properties at every quadrature point of the context.
    fn compute_properties(&self, context: &EvaluationContext) -> eyre::Result<()>;
}

/// Holds the property providers of a problem and evaluates them in dependency order.
///
/// Every provider of a property is evaluated before all providers consuming it. The order is
/// computed once in [`initial_setup`](Self::initial_setup).
pub struct MaterialWarehouse {
    registry: Arc<MaterialPropertyRegistry>,
    providers: Vec<Box<dyn PropertyProvider>>,
    order: Option<Vec<usize>>,
}

impl MaterialWarehouse {
    pub fn new(registry: Arc<MaterialPropertyRegistry>) -> Self {
        Self {
            registry,
            providers: Vec::new(),
            order: None,
        }
    }

    pub fn registry(&self) -> &Arc<MaterialPropertyRegistry> {
        &self.registry
    }

    pub fn add_provider(&mut self, provider: Box<dyn PropertyProvider>) {
        self.providers.push(provider);
        self.order = None;
    }

    pub fn num_providers(&self) -> usize {
        self.providers.len()
    }

    /// Sets up all providers and determines the order of evaluation.
    ///
    /// Fails if a property is requested but never declared, or if providers depend on each other
    /// cyclically.
    pub fn initial_setup(&mut self) -> eyre::Result<()> {
        for provider in &mut self.providers {
            let name = provider.name().to_string();
            provider
                .initial_setup()
                .wrap_err_with(|| format!("Initial setup of '{}' failed", name))?;
        }
        self.registry.check_requested_properties()?;

        let mut graph = DiGraph::<usize, ()>::new();
        let nodes: Vec<NodeIndex> = (0..self.providers.len()).map(|i| graph.add_node(i)).collect();
        let mut declarers: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (i, provider) in self.providers.iter().enumerate() {
            for property in provider.declared_properties() {
                declarers.entry(property).or_default().push(i);
            }
        }
        for (consumer, provider) in self.providers.iter().enumerate() {
            for property in provider.consumed_properties() {
                for &declarer in declarers.get(&property).into_iter().flatten() {
                    // Providers reading their own (old) values do not constrain the order
                    if declarer != consumer {
                        graph.update_edge(nodes[declarer], nodes[consumer], ());
                    }
                }
            }
        }

        let order = match toposort(&graph, None) {
            Ok(sorted) => sorted.into_iter().map(|node| graph[node]).collect_vec(),
            Err(cycle) => {
                let involved = tarjan_scc(&graph)
                    .into_iter()
                    .find(|component| component.contains(&cycle.node_id()))
                    .unwrap_or_else(|| vec![cycle.node_id()]);
                return Err(eyre!(
                    "Cyclic dependency between material property providers {}",
                    involved
                        .iter()
                        .map(|node| format!("'{}'", self.providers[graph[*node]].name()))
                        .sorted()
                        .join(", ")
                ));
            }
        };
        debug!(
            "Material evaluation order: {}",
            order.iter().map(|&i| self.providers[i].name()).join(", ")
        );
        self.order = Some(order);
        Ok(())
    }

    /// Names of the providers in the order they are evaluated, once set up.
    pub fn evaluation_order(&self) -> Option<Vec<&str>> {
        self.order
            .as_ref()
            .map(|order| order.iter().map(|&i| self.providers[i].name()).collect())
    }

    /// Evaluates every provider at the quadrature points of the given context.
    pub fn compute_properties(&self, context: &EvaluationContext) -> eyre::Result<()> {
        let order = self
            .order
            .as_ref()
            .ok_or_else(|| eyre!("Material warehouse must be set up before computing properties"))?;
        self.registry.resize_qps(context.n_qp());
        for &i in order {
            let provider = &self.providers[i];
            provider
                .compute_properties(context)
                .wrap_err_with(|| format!("Failed to compute material properties of '{}'", provider.name()))?;
        }
        Ok(())
    }

    /// Stores the current property values as old values, for the next time step.
    pub fn advance_time_step(&self) {
        self.registry.advance_time_step();
    }
}
