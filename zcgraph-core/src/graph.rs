//! In-memory graph handed to the writer.
//!
//! Nodes and edges keep insertion order; that order is the order of the
//! node and edge tables in the written file. Edges name their endpoints by
//! node id, and the writer resolves ids to table positions.

/// A node to be written
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    /// Application-level identifier, unique within the graph
    pub id: u64,
    /// Type tag
    pub node_type: u16,
    /// Application flag bits
    pub flags: u16,
    /// Optional variable-length payload
    pub payload: Option<Vec<u8>>,
}

impl NodeSpec {
    /// A node with type 0, no flags and no payload
    pub fn new(id: u64) -> Self {
        Self {
            id,
            node_type: 0,
            flags: 0,
            payload: None,
        }
    }

    /// Set the type tag
    #[must_use]
    pub fn with_type(mut self, node_type: u16) -> Self {
        self.node_type = node_type;
        self
    }

    /// Set the flag bits
    #[must_use]
    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    /// Attach a payload
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

/// A directed edge to be written
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    /// Id of the source node
    pub source: u64,
    /// Id of the target node
    pub target: u64,
    /// Type value
    pub edge_type: u32,
    /// Weight, stored bit-exactly when the file is written with weighted edges
    pub weight: f64,
    /// Optional variable-length payload
    pub payload: Option<Vec<u8>>,
}

impl EdgeSpec {
    /// An edge with type 0, weight 1.0 and no payload
    pub fn new(source: u64, target: u64) -> Self {
        Self {
            source,
            target,
            edge_type: 0,
            weight: 1.0,
            payload: None,
        }
    }

    /// Set the type value
    #[must_use]
    pub fn with_type(mut self, edge_type: u32) -> Self {
        self.edge_type = edge_type;
        self
    }

    /// Set the weight
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Attach a payload
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

/// Ordered collection of nodes and edges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<NodeSpec>,
    edges: Vec<EdgeSpec>,
}

impl Graph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph of `node_count` nodes whose ids equal their positions,
    /// connected by `edges` given as `(source_id, target_id)` pairs.
    pub fn from_edges(node_count: u64, edges: impl IntoIterator<Item = (u64, u64)>) -> Self {
        let mut graph = Self::new();
        for id in 0..node_count {
            graph.add_node(NodeSpec::new(id));
        }
        for (source, target) in edges {
            graph.add_edge(EdgeSpec::new(source, target));
        }
        graph
    }

    /// Appends a node; returns its position
    pub fn add_node(&mut self, node: NodeSpec) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Appends an edge; returns its position
    pub fn add_edge(&mut self, edge: EdgeSpec) -> usize {
        self.edges.push(edge);
        self.edges.len() - 1
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[EdgeSpec] {
        &self.edges
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
