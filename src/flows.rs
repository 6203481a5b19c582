use crate::repository::{BridgeEvent, FlowRow};
use crate::tally::Tally;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowEdge {
    pub source: u32,
    pub target: u32,
    pub count: u64,
}

/// Inbound graphs list origins ascending and then the sink. Outbound graphs
/// start with the source and then list destinations ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowGraph {
    nodes: Vec<u32>,
    edges: Vec<FlowEdge>,
}

/// Index-based link arrays, the shape Sankey renderers consume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SankeyLinks {
    pub sources: Vec<usize>,
    pub targets: Vec<usize>,
    pub values: Vec<u64>,
}

impl FlowGraph {
    /// Edges `origin -> sink`, counts given per origin in first-seen order.
    pub fn inbound(sink: u32, counts: Vec<(u32, u64)>) -> Self {
        if counts.is_empty() {
            return Self::default();
        }
        let mut nodes: Vec<u32> = counts.iter().map(|(origin, _)| *origin).collect();
        nodes.sort_unstable();
        nodes.push(sink);

        let edges = counts
            .into_iter()
            .map(|(source, count)| FlowEdge {
                source,
                target: sink,
                count,
            })
            .collect();
        Self { nodes, edges }
    }

    /// Edges `source -> destination`, counts given per destination in
    /// first-seen order.
    pub fn outbound(source: u32, counts: Vec<(u32, u64)>) -> Self {
        if counts.is_empty() {
            return Self::default();
        }
        let mut destinations: Vec<u32> = counts.iter().map(|(target, _)| *target).collect();
        destinations.sort_unstable();
        let mut nodes = Vec::with_capacity(destinations.len() + 1);
        nodes.push(source);
        nodes.extend(destinations);

        let edges = counts
            .into_iter()
            .map(|(target, count)| FlowEdge {
                source,
                target,
                count,
            })
            .collect();
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[u32] {
        &self.nodes
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.edges.iter().map(|e| e.count).sum()
    }

    pub fn node_index(&self, network: u32) -> Option<usize> {
        self.nodes.iter().position(|n| *n == network)
    }

    pub fn edge(&self, source: u32, target: u32) -> Option<u64> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
            .map(|e| e.count)
    }

    /// Node labels from a name lookup, `Network {id}` when unnamed.
    pub fn labels(&self, names: &HashMap<u32, String>) -> Vec<String> {
        self.nodes
            .iter()
            .map(|id| network_label(*id, names))
            .collect()
    }

    pub fn links(&self) -> SankeyLinks {
        let index: HashMap<u32, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();

        let mut links = SankeyLinks::default();
        for edge in &self.edges {
            if let (Some(&s), Some(&t)) = (index.get(&edge.source), index.get(&edge.target)) {
                links.sources.push(s);
                links.targets.push(t);
                links.values.push(edge.count);
            }
        }
        links
    }
}

pub fn network_label(id: u32, names: &HashMap<u32, String>) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("Network {id}"))
}

/// Inbound and outbound flows of one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainFlows {
    pub chain: u32,
    pub inbound: FlowGraph,
    pub outbound: FlowGraph,
}

impl ChainFlows {
    pub fn total_inbound(&self) -> u64 {
        self.inbound.total()
    }

    pub fn total_outbound(&self) -> u64 {
        self.outbound.total()
    }
}

fn endpoints(event: &BridgeEvent) -> Option<(u32, u32)> {
    Some((event.origin_network?, event.destination_network?))
}

/// One inbound graph per destination network, destinations ascending.
/// Events missing either endpoint and self-loops are skipped.
pub fn build_per_destination(events: &[BridgeEvent]) -> BTreeMap<u32, FlowGraph> {
    let mut by_destination: BTreeMap<u32, Tally<u32>> = BTreeMap::new();

    for (origin, destination) in events.iter().filter_map(endpoints) {
        if origin == destination {
            continue;
        }
        by_destination
            .entry(destination)
            .or_default()
            .increment(origin);
    }

    by_destination
        .into_iter()
        .map(|(destination, origins)| {
            (
                destination,
                FlowGraph::inbound(destination, origins.into_entries()),
            )
        })
        .collect()
}

/// Inbound/outbound graphs for `chain`, or for every network seen as an
/// origin or destination when `chain` is `None`.
pub fn build_inbound_outbound(
    events: &[BridgeEvent],
    chain: Option<u32>,
) -> BTreeMap<u32, ChainFlows> {
    let mut seen: BTreeSet<u32> = BTreeSet::new();
    let mut inbound: HashMap<u32, Tally<u32>> = HashMap::new();
    let mut outbound: HashMap<u32, Tally<u32>> = HashMap::new();

    for event in events {
        seen.extend(event.origin_network);
        seen.extend(event.destination_network);

        let Some((origin, destination)) = endpoints(event) else {
            continue;
        };
        if origin == destination {
            continue;
        }
        inbound.entry(destination).or_default().increment(origin);
        outbound.entry(origin).or_default().increment(destination);
    }

    let chains: Vec<u32> = match chain {
        Some(chain) => vec![chain],
        None => seen.into_iter().collect(),
    };

    chains
        .into_iter()
        .map(|chain| {
            let flows = ChainFlows {
                chain,
                inbound: FlowGraph::inbound(
                    chain,
                    inbound.remove(&chain).unwrap_or_default().into_entries(),
                ),
                outbound: FlowGraph::outbound(
                    chain,
                    outbound.remove(&chain).unwrap_or_default().into_entries(),
                ),
            };
            (chain, flows)
        })
        .collect()
}

/// Inbound/outbound graphs for `chain` from rows the backend already
/// aggregated. Counts are taken as given and summed per opposing network.
pub fn build_from_aggregated_rows(rows: &[FlowRow], chain: u32) -> ChainFlows {
    let mut inbound: Tally<u32> = Tally::new();
    let mut outbound: Tally<u32> = Tally::new();

    for row in rows {
        let (Some(source), Some(target)) = (row.source, row.target) else {
            debug!("Skipping flow row with non-numeric endpoint: {:?}", row);
            continue;
        };
        if source == chain && target != chain {
            outbound.add(target, row.value);
        } else if target == chain && source != chain {
            inbound.add(source, row.value);
        }
    }

    ChainFlows {
        chain,
        inbound: FlowGraph::inbound(chain, inbound.into_entries()),
        outbound: FlowGraph::outbound(chain, outbound.into_entries()),
    }
}
