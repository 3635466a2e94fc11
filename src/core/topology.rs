use super::errors::SimError;
use super::pool::DurationPool;
use super::types::{ComponentId, InspectorId, ProductId, WorkstationId};

/// A raw-material type. Carries no state beyond its name.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
}

/// A product and the distinct components one unit of it requires
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub required_components: Vec<ComponentId>,
}

/// Setup data for one workstation process
#[derive(Debug, Clone)]
pub struct WorkstationSpec {
    pub id: WorkstationId,
    pub name: String,
    pub product: ProductId,
    pub processing_times: DurationPool,
}

/// Setup data for one inspector process
#[derive(Debug, Clone)]
pub struct InspectorSpec {
    pub id: InspectorId,
    pub name: String,
    /// Inspected components with their inspection time pools
    pub components: Vec<(ComponentId, DurationPool)>,
    /// Downstream workstations in priority order
    pub candidates: Vec<WorkstationId>,
}

/// Imperative API for describing the line before a run
///
/// Entities get their handles in insertion order. Handles are only
/// meaningful for the topology that created them.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    components: Vec<Component>,
    products: Vec<Product>,
    workstations: Vec<WorkstationSpec>,
    inspectors: Vec<InspectorSpec>,
}

impl Topology {
    /// Create an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component type
    pub fn add_component(&mut self, name: &str) -> ComponentId {
        let id = ComponentId(self.components.len());
        self.components.push(Component {
            id,
            name: name.to_string(),
        });
        id
    }

    /// Add a product built from the given components
    ///
    /// Repeated components are collapsed; each distinct component is
    /// needed exactly once per unit, in first-mention order.
    pub fn add_product(
        &mut self,
        name: &str,
        required_components: &[ComponentId],
    ) -> Result<ProductId, SimError> {
        if required_components.is_empty() {
            return Err(SimError::EmptyProduct(name.to_string()));
        }
        let mut required = Vec::with_capacity(required_components.len());
        for component in required_components {
            self.check_component(*component)?;
            if !required.contains(component) {
                required.push(*component);
            }
        }

        let id = ProductId(self.products.len());
        self.products.push(Product {
            id,
            name: name.to_string(),
            required_components: required,
        });
        Ok(id)
    }

    /// Add a workstation building `product`
    pub fn add_workstation(
        &mut self,
        name: &str,
        product: ProductId,
        processing_times: DurationPool,
    ) -> Result<WorkstationId, SimError> {
        if product.0 >= self.products.len() {
            return Err(SimError::UnknownProduct(format!("#{}", product.0)));
        }
        let id = WorkstationId(self.workstations.len());
        self.workstations.push(WorkstationSpec {
            id,
            name: name.to_string(),
            product,
            processing_times,
        });
        Ok(id)
    }

    /// Add an inspector producing `components` for the `candidates`
    ///
    /// Routing is checked here: every inspected component must be buffered
    /// by at least one candidate workstation.
    pub fn add_inspector(
        &mut self,
        name: &str,
        components: Vec<(ComponentId, DurationPool)>,
        candidates: Vec<WorkstationId>,
    ) -> Result<InspectorId, SimError> {
        if components.is_empty() {
            return Err(SimError::EmptyInspector(name.to_string()));
        }
        for candidate in &candidates {
            if candidate.0 >= self.workstations.len() {
                return Err(SimError::UnknownWorkstation(format!("#{}", candidate.0)));
            }
        }
        for (component, _) in &components {
            self.check_component(*component)?;
            if self.eligible_workstations(&candidates, *component).is_empty() {
                return Err(SimError::UnroutableComponent {
                    inspector: name.to_string(),
                    component: self.components[component.0].name.clone(),
                });
            }
        }

        let id = InspectorId(self.inspectors.len());
        self.inspectors.push(InspectorSpec {
            id,
            name: name.to_string(),
            components,
            candidates,
        });
        Ok(id)
    }

    /// Candidates whose product requires `component`, keeping candidate order
    pub fn eligible_workstations(
        &self,
        candidates: &[WorkstationId],
        component: ComponentId,
    ) -> Vec<WorkstationId> {
        candidates
            .iter()
            .copied()
            .filter(|ws| {
                let product = self.workstations[ws.0].product;
                self.products[product.0]
                    .required_components
                    .contains(&component)
            })
            .collect()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn workstations(&self) -> &[WorkstationSpec] {
        &self.workstations
    }

    pub fn inspectors(&self) -> &[InspectorSpec] {
        &self.inspectors
    }

    /// Get a component by handle
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    /// Get a product by handle
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(id.0)
    }

    fn check_component(&self, id: ComponentId) -> Result<(), SimError> {
        if id.0 >= self.components.len() {
            return Err(SimError::UnknownComponent(format!("#{}", id.0)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> DurationPool {
        DurationPool::constant("test", 1.0, 4).unwrap()
    }

    #[test]
    fn test_same_name_components_are_distinct() {
        let mut topology = Topology::new();
        let a = topology.add_component("Component");
        let b = topology.add_component("Component");
        assert_ne!(a, b);
    }

    #[test]
    fn test_product_collapses_repeated_components() {
        let mut topology = Topology::new();
        let c1 = topology.add_component("C1");
        let c2 = topology.add_component("C2");
        let product = topology.add_product("P", &[c1, c2, c1]).unwrap();
        assert_eq!(
            topology.product(product).unwrap().required_components,
            vec![c1, c2]
        );
    }

    #[test]
    fn test_empty_product_is_rejected() {
        let mut topology = Topology::new();
        assert_eq!(
            topology.add_product("P", &[]),
            Err(SimError::EmptyProduct("P".to_string()))
        );
    }

    #[test]
    fn test_unroutable_component_is_rejected() {
        let mut topology = Topology::new();
        let c1 = topology.add_component("C1");
        let c2 = topology.add_component("C2");
        let product = topology.add_product("P1", &[c1]).unwrap();
        let ws = topology.add_workstation("WS1", product, pool()).unwrap();

        let result = topology.add_inspector("I1", vec![(c2, pool())], vec![ws]);
        assert_eq!(
            result,
            Err(SimError::UnroutableComponent {
                inspector: "I1".to_string(),
                component: "C2".to_string(),
            })
        );
    }

    #[test]
    fn test_eligible_workstations_keep_candidate_order() {
        let mut topology = Topology::new();
        let c1 = topology.add_component("C1");
        let c2 = topology.add_component("C2");
        let p1 = topology.add_product("P1", &[c1]).unwrap();
        let p2 = topology.add_product("P2", &[c1, c2]).unwrap();
        let w1 = topology.add_workstation("WS1", p1, pool()).unwrap();
        let w2 = topology.add_workstation("WS2", p2, pool()).unwrap();

        assert_eq!(topology.eligible_workstations(&[w2, w1], c1), vec![w2, w1]);
        assert_eq!(topology.eligible_workstations(&[w1, w2], c2), vec![w2]);
    }
}
