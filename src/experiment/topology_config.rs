use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::durations::DurationSource;
use crate::core::errors::SimError;
use crate::core::topology::Topology;
use crate::core::types::{ComponentId, ProductId, WorkstationId};

/// A product and the names of the components it requires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub name: String,
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkstationConfig {
    pub name: String,
    pub product: String,
    pub processing: DurationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectedComponentConfig {
    pub component: String,
    pub inspection: DurationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorConfig {
    pub name: String,
    pub components: Vec<InspectedComponentConfig>,
    /// Candidate workstations in routing priority order
    pub workstations: Vec<String>,
}

/// Name-based description of a line, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub components: Vec<String>,
    pub products: Vec<ProductConfig>,
    pub workstations: Vec<WorkstationConfig>,
    pub inspectors: Vec<InspectorConfig>,
}

impl TopologyConfig {
    /// The reference line: three components, three products, three
    /// workstations and two inspectors with exponential service times
    pub fn reference() -> Self {
        let exp = |mean: f64| DurationSource::Exponential { mean };
        let names = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            components: names(&["Component 1", "Component 2", "Component 3"]),
            products: vec![
                ProductConfig {
                    name: "Product 1".to_string(),
                    components: names(&["Component 1"]),
                },
                ProductConfig {
                    name: "Product 2".to_string(),
                    components: names(&["Component 1", "Component 2"]),
                },
                ProductConfig {
                    name: "Product 3".to_string(),
                    components: names(&["Component 1", "Component 3"]),
                },
            ],
            workstations: vec![
                WorkstationConfig {
                    name: "Workstation 1".to_string(),
                    product: "Product 1".to_string(),
                    processing: exp(4.604416667),
                },
                WorkstationConfig {
                    name: "Workstation 2".to_string(),
                    product: "Product 2".to_string(),
                    processing: exp(11.09260667),
                },
                WorkstationConfig {
                    name: "Workstation 3".to_string(),
                    product: "Product 3".to_string(),
                    processing: exp(8.79558),
                },
            ],
            inspectors: vec![
                InspectorConfig {
                    name: "Inspector 1".to_string(),
                    components: vec![InspectedComponentConfig {
                        component: "Component 1".to_string(),
                        inspection: exp(10.35791),
                    }],
                    workstations: names(&["Workstation 1", "Workstation 2", "Workstation 3"]),
                },
                InspectorConfig {
                    name: "Inspector 2".to_string(),
                    components: vec![
                        InspectedComponentConfig {
                            component: "Component 2".to_string(),
                            inspection: exp(15.53690333),
                        },
                        InspectedComponentConfig {
                            component: "Component 3".to_string(),
                            inspection: exp(20.63275667),
                        },
                    ],
                    workstations: names(&["Workstation 2", "Workstation 3"]),
                },
            ],
        }
    }

    /// Resolve names and draw every duration pool
    ///
    /// Pools are drawn in declaration order (workstations, then inspectors)
    /// so a seeded `rng` always yields the same topology.
    pub fn build<R: Rng + ?Sized>(&self, pool_size: usize, rng: &mut R) -> Result<Topology, SimError> {
        check_unique(self.components.iter())?;
        check_unique(self.products.iter().map(|p| &p.name))?;
        check_unique(self.workstations.iter().map(|w| &w.name))?;
        check_unique(self.inspectors.iter().map(|i| &i.name))?;

        let mut topology = Topology::new();
        let mut components: HashMap<&str, ComponentId> = HashMap::new();
        for name in &self.components {
            components.insert(name, topology.add_component(name));
        }
        let component = |name: &str| {
            components
                .get(name)
                .copied()
                .ok_or_else(|| SimError::UnknownComponent(name.to_string()))
        };

        let mut products: HashMap<&str, ProductId> = HashMap::new();
        for product in &self.products {
            let required = product
                .components
                .iter()
                .map(|name| component(name))
                .collect::<Result<Vec<_>, _>>()?;
            products.insert(&product.name, topology.add_product(&product.name, &required)?);
        }

        let mut workstations: HashMap<&str, WorkstationId> = HashMap::new();
        for ws in &self.workstations {
            let product = products
                .get(ws.product.as_str())
                .copied()
                .ok_or_else(|| SimError::UnknownProduct(ws.product.clone()))?;
            let pool = ws.processing.materialize(&ws.name, pool_size, rng)?;
            workstations.insert(&ws.name, topology.add_workstation(&ws.name, product, pool)?);
        }

        for inspector in &self.inspectors {
            let candidates = inspector
                .workstations
                .iter()
                .map(|name| {
                    workstations
                        .get(name.as_str())
                        .copied()
                        .ok_or_else(|| SimError::UnknownWorkstation(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let mut inspected = Vec::with_capacity(inspector.components.len());
            for entry in &inspector.components {
                let owner = format!("{}/{}", inspector.name, entry.component);
                let pool = entry.inspection.materialize(&owner, pool_size, rng)?;
                inspected.push((component(&entry.component)?, pool));
            }
            topology.add_inspector(&inspector.name, inspected, candidates)?;
        }

        Ok(topology)
    }

    /// Labels of every duration source, in declaration order
    ///
    /// Workstations are labelled by name, inspections by `inspector/component`.
    pub fn duration_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.workstations.iter().map(|w| w.name.clone()).collect();
        for inspector in &self.inspectors {
            for entry in &inspector.components {
                labels.push(format!("{}/{}", inspector.name, entry.component));
            }
        }
        labels
    }

    /// Mutable access to the duration source with the given label
    pub fn duration_source_mut(&mut self, label: &str) -> Option<&mut DurationSource> {
        if let Some(ws) = self.workstations.iter_mut().find(|w| w.name == label) {
            return Some(&mut ws.processing);
        }
        let (inspector, component) = label.split_once('/')?;
        self.inspectors
            .iter_mut()
            .find(|i| i.name == inspector)?
            .components
            .iter_mut()
            .find(|c| c.component == component)
            .map(|c| &mut c.inspection)
    }

    /// Multiply the mean of one duration source by `factor`
    pub fn scale_duration(&mut self, label: &str, factor: f64) -> Result<(), SimError> {
        self.duration_source_mut(label)
            .ok_or_else(|| SimError::InvalidConfig(format!("no duration source '{}'", label)))?
            .scale(factor)
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self::reference()
    }
}

fn check_unique<'a>(names: impl Iterator<Item = &'a String>) -> Result<(), SimError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SimError::DuplicateName(name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_reference_topology_builds() {
        let mut rng = StdRng::seed_from_u64(1);
        let topology = TopologyConfig::reference().build(100, &mut rng).unwrap();

        assert_eq!(topology.components().len(), 3);
        assert_eq!(topology.products().len(), 3);
        assert_eq!(topology.workstations().len(), 3);
        assert_eq!(topology.inspectors().len(), 2);
        assert_eq!(topology.inspectors()[1].components.len(), 2);
        assert_eq!(topology.workstations()[0].processing_times.remaining(), 100);
    }

    #[test]
    fn test_unknown_component_is_reported() {
        let mut config = TopologyConfig::reference();
        config.products[0].components.push("Component 9".to_string());
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            config.build(10, &mut rng).unwrap_err(),
            SimError::UnknownComponent("Component 9".to_string())
        );
    }

    #[test]
    fn test_duplicate_workstation_is_reported() {
        let mut config = TopologyConfig::reference();
        config.workstations[2].name = "Workstation 1".to_string();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            config.build(10, &mut rng).unwrap_err(),
            SimError::DuplicateName("Workstation 1".to_string())
        );
    }

    #[test]
    fn test_unroutable_component_detected_at_setup() {
        let mut config = TopologyConfig::reference();
        // Inspector 2 may no longer reach the only users of Component 3
        config.inspectors[1].workstations = vec!["Workstation 2".to_string()];
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            config.build(10, &mut rng).unwrap_err(),
            SimError::UnroutableComponent {
                inspector: "Inspector 2".to_string(),
                component: "Component 3".to_string(),
            }
        );
    }

    #[test]
    fn test_duration_labels_and_scaling() {
        let mut config = TopologyConfig::reference();
        assert_eq!(
            config.duration_labels(),
            vec![
                "Workstation 1",
                "Workstation 2",
                "Workstation 3",
                "Inspector 1/Component 1",
                "Inspector 2/Component 2",
                "Inspector 2/Component 3",
            ]
        );

        config.scale_duration("Inspector 2/Component 3", 2.0).unwrap();
        assert_eq!(
            config.inspectors[1].components[1].inspection,
            DurationSource::Exponential {
                mean: 2.0 * 20.63275667
            }
        );
        assert!(config.scale_duration("Inspector 7/Component 1", 2.0).is_err());
    }

    #[test]
    fn test_json_round_trip_of_reference() {
        let json = serde_json::to_string(&TopologyConfig::reference()).unwrap();
        let parsed: TopologyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TopologyConfig::reference());
    }
}
