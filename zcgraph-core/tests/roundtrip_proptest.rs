use proptest::prelude::*;
use zcgraph_core::{EdgeSpec, Graph, GraphBytes, GraphWriter, NodeSpec, WriteOptions, varint};

#[derive(Debug, Clone)]
struct Input {
    ids: Vec<u64>,
    nodes: Vec<(u16, u16, Option<Vec<u8>>)>,
    edges: Vec<(usize, usize, u32, f64, Option<Vec<u8>>)>,
    options: WriteOptions,
}

fn payload() -> impl Strategy<Value = Option<Vec<u8>>> {
    proptest::option::of(proptest::collection::vec(any::<u8>(), 0..300))
}

fn input() -> impl Strategy<Value = Input> {
    (1usize..40, any::<bool>(), any::<u64>())
        .prop_flat_map(|(n, sparse, seed)| {
            // Distinct ids: positions, or positions spread by an odd stride
            let ids: Vec<u64> = if sparse {
                (0..n as u64)
                    .map(|p| seed.wrapping_add(p.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
                    .collect()
            } else {
                (0..n as u64).collect()
            };
            (
                Just(ids),
                proptest::collection::vec((any::<u16>(), any::<u16>(), payload()), n),
                proptest::collection::vec(
                    (0..n, 0..n, any::<u32>(), any::<f64>(), payload()),
                    0..120,
                ),
                (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()),
            )
        })
        .prop_map(|(ids, nodes, edges, (build_index, weighted_edges, compress, stats))| Input {
            ids,
            nodes,
            edges,
            options: WriteOptions {
                build_index,
                weighted_edges,
                compress,
                stats,
            },
        })
}

fn build(input: &Input) -> Graph {
    let mut graph = Graph::new();
    for (&id, (node_type, flags, payload)) in input.ids.iter().zip(&input.nodes) {
        let mut node = NodeSpec::new(id).with_type(*node_type).with_flags(*flags);
        node.payload = payload.clone();
        graph.add_node(node);
    }
    for (source, target, edge_type, weight, payload) in &input.edges {
        let mut edge = EdgeSpec::new(input.ids[*source], input.ids[*target])
            .with_type(*edge_type)
            .with_weight(*weight);
        edge.payload = payload.clone();
        graph.add_edge(edge);
    }
    graph
}

proptest! {
    #[test]
    fn test_written_graph_reads_back(input in input()) {
        let graph = build(&input);
        let buf = GraphWriter::new(input.options).write(&graph).unwrap();
        let parsed = GraphBytes::parse(&buf).unwrap();

        prop_assert_eq!(parsed.nodes().len(), graph.node_count());
        prop_assert_eq!(parsed.edges().len(), graph.edge_count());
        prop_assert_eq!(parsed.header().flags() & 0b1111, input.options.flags());

        for (position, spec) in (0u32..).zip(graph.nodes()) {
            let record = parsed.node(position).unwrap();
            prop_assert_eq!(record.id(), spec.id);
            prop_assert_eq!(record.node_type(), spec.node_type);
            prop_assert_eq!(record.flags(), spec.flags);
            let payload = parsed.node_payload(position).unwrap();
            prop_assert_eq!(payload, spec.payload.as_deref());
            prop_assert_eq!(parsed.position_of(spec.id).unwrap(), position);
        }

        for (position, spec) in (0u32..).zip(graph.edges()) {
            let record = parsed.edge(position).unwrap();
            prop_assert_eq!(parsed.node(record.source()).unwrap().id(), spec.source);
            prop_assert_eq!(parsed.node(record.target()).unwrap().id(), spec.target);
            prop_assert_eq!(record.edge_type(), spec.edge_type);
            let payload = parsed.edge_payload(position).unwrap();
            prop_assert_eq!(payload, spec.payload.as_deref());

            let weight = parsed.weight(position).unwrap();
            if input.options.weighted_edges {
                prop_assert_eq!(weight.map(f64::to_bits), Some(spec.weight.to_bits()));
            } else {
                prop_assert_eq!(weight, None);
            }
        }

        let degrees = parsed.view().degree_distribution();
        let total: usize = degrees.iter().map(|&d| d as usize).sum();
        prop_assert_eq!(total, graph.edge_count());
    }

    #[test]
    fn test_varint_decodes_what_it_encodes(
        value in any::<u64>(),
        trailing in proptest::collection::vec(any::<u8>(), 0..4),
    ) {
        let mut buf = Vec::new();
        varint::encode(value, &mut buf);
        prop_assert_eq!(buf.len(), varint::encoded_len(value));
        buf.extend_from_slice(&trailing);
        let expected = Some((value, varint::encoded_len(value)));
        prop_assert_eq!(varint::decode(&buf), expected);
    }
}
