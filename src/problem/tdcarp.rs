use ahash::AHashSet;
use serde::Serialize;

use crate::problem::{ConvertError, Time, VertexId};

/// The ten header values of a TDCARP instance file, fixed after parsing.
#[derive(Debug, Clone)]
pub struct InstanceHeader {
    pub name: String,
    pub vertex_count: usize,
    pub required_edge_count: usize,
    pub nonrequired_edge_count: usize,
    pub vehicle_count: usize,
    pub capacity: usize,
    /// depot vertex index, 0 <= depot < vertex_count
    pub depot: VertexId,
    /// planning horizon [start, end), start < end
    pub horizon: (Time, Time),
    pub service_speed_factor: f64,
}

/// One connection record as it appears in the input, before classification
/// and travel-time normalization.
#[derive(Debug, Clone)]
pub struct RawConnection {
    pub tail: VertexId,
    pub head: VertexId,
    pub distance: usize,
    pub demand: usize,
    pub period_count: usize,
    /// period_count - 1 boundaries, strictly increasing, each < horizon end
    pub period_ends: Vec<Time>,
    /// period_count speeds, each > 0
    pub period_speeds: Vec<f64>,
}

/// Parse result of one instance file.
#[derive(Debug)]
pub struct ParsedInstance {
    pub header: InstanceHeader,
    pub connections: Vec<RawConnection>,
}

/// One piece of a piecewise-constant travel speed function: `speed` holds
/// until `piece_end`. The last piece of every connection ends at the horizon
/// end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TravelTimePiece {
    pub piece_end: Time,
    pub speed: f64,
}

#[derive(Debug, Serialize)]
pub struct NormalizedConnection {
    pub tail: VertexId,
    pub head: VertexId,
    pub distance: usize,
    pub demand: usize,
    pub travel_time: Vec<TravelTimePiece>,
}

#[derive(Debug, Serialize)]
pub struct Graph {
    pub vertex_count: usize,
    pub arcs: Vec<NormalizedConnection>,
    pub edges: Vec<NormalizedConnection>,
}

/// The output document. Field order is the serialized key order.
#[derive(Debug, Serialize)]
pub struct InstanceDocument {
    pub instance_name: String,
    pub vehicle_count: usize,
    pub capacity: usize,
    pub depot: VertexId,
    pub horizon: (Time, Time),
    pub service_speed_factor: f64,
    pub graph: Graph,
}

/// Arc/edge partition of the raw connections, parser order preserved within
/// each.
#[derive(Debug)]
pub struct Classified<'a> {
    pub arcs: Vec<&'a RawConnection>,
    pub edges: Vec<&'a RawConnection>,
}

/// Validates all connections against the vertex range, rejects repeated
/// ordered pairs, and partitions into arcs and edges. A connection is an edge
/// iff its reverse ordered pair is also present; both directions of an edge
/// pair are kept.
pub fn classify_connections(
    connections: &[RawConnection],
    vertex_count: usize,
) -> Result<Classified<'_>, ConvertError> {
    let mut pairs: AHashSet<(VertexId, VertexId)> = AHashSet::with_capacity(connections.len());
    for connection in connections {
        if connection.tail == connection.head
            || connection.tail >= vertex_count
            || connection.head >= vertex_count
        {
            return Err(ConvertError::Range {
                tail: connection.tail,
                head: connection.head,
                vertex_count,
            });
        }
        if !pairs.insert((connection.tail, connection.head)) {
            return Err(ConvertError::DuplicateConnection {
                tail: connection.tail,
                head: connection.head,
            });
        }
    }

    let mut arcs = vec![];
    let mut edges = vec![];
    for connection in connections {
        if pairs.contains(&(connection.head, connection.tail)) {
            edges.push(connection);
        } else {
            arcs.push(connection);
        }
    }

    Ok(Classified { arcs, edges })
}

/// Expands the period boundaries and speeds into travel-time pieces. The
/// input encodes no boundary for the last period, so the last piece always
/// ends at the horizon end.
pub fn normalize_travel_time(connection: &RawConnection, horizon_end: Time) -> Vec<TravelTimePiece> {
    (0..connection.period_count)
        .map(|i| TravelTimePiece {
            piece_end: if i + 1 < connection.period_count {
                connection.period_ends[i]
            } else {
                horizon_end
            },
            speed: connection.period_speeds[i],
        })
        .collect()
}

/// Assembles the output document from a parsed instance.
pub fn build_instance(parsed: ParsedInstance) -> anyhow::Result<InstanceDocument> {
    let ParsedInstance {
        header,
        connections,
    } = parsed;

    let classified = classify_connections(&connections, header.vertex_count)?;
    let horizon_end = header.horizon.1;

    let normalize = |connection: &RawConnection| NormalizedConnection {
        tail: connection.tail,
        head: connection.head,
        distance: connection.distance,
        demand: connection.demand,
        travel_time: normalize_travel_time(connection, horizon_end),
    };

    let graph = Graph {
        vertex_count: header.vertex_count,
        arcs: classified.arcs.iter().map(|it| normalize(it)).collect(),
        edges: classified.edges.iter().map(|it| normalize(it)).collect(),
    };

    Ok(InstanceDocument {
        instance_name: header.name,
        vehicle_count: header.vehicle_count,
        capacity: header.capacity,
        depot: header.depot,
        horizon: header.horizon,
        service_speed_factor: header.service_speed_factor,
        graph,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(tail: VertexId, head: VertexId) -> RawConnection {
        RawConnection {
            tail,
            head,
            distance: 10,
            demand: 5,
            period_count: 2,
            period_ends: vec![3],
            period_speeds: vec![2.0, 4.0],
        }
    }

    fn header(vertex_count: usize) -> InstanceHeader {
        InstanceHeader {
            name: "test".to_string(),
            vertex_count,
            required_edge_count: 0,
            nonrequired_edge_count: 0,
            vehicle_count: 1,
            capacity: 10,
            depot: 0,
            horizon: (0, 100),
            service_speed_factor: 1.0,
        }
    }

    #[test]
    fn reciprocal_pair_classifies_as_edges() {
        let connections = vec![connection(0, 1), connection(1, 0), connection(0, 2)];
        let classified = classify_connections(&connections, 3).unwrap();

        assert_eq!(
            classified
                .edges
                .iter()
                .map(|it| (it.tail, it.head))
                .collect::<Vec<_>>(),
            vec![(0, 1), (1, 0)]
        );
        assert_eq!(
            classified
                .arcs
                .iter()
                .map(|it| (it.tail, it.head))
                .collect::<Vec<_>>(),
            vec![(0, 2)]
        );
    }

    #[test]
    fn arcs_and_edges_partition_the_connections() {
        let connections = vec![
            connection(0, 1),
            connection(1, 2),
            connection(2, 1),
            connection(3, 0),
            connection(0, 3),
            connection(2, 0),
        ];
        let classified = classify_connections(&connections, 4).unwrap();

        assert_eq!(
            classified.arcs.len() + classified.edges.len(),
            connections.len()
        );
        let arcs: Vec<_> = classified.arcs.iter().map(|it| (it.tail, it.head)).collect();
        let edges: Vec<_> = classified
            .edges
            .iter()
            .map(|it| (it.tail, it.head))
            .collect();
        assert!(arcs.iter().all(|pair| !edges.contains(pair)));
        assert_eq!(arcs, vec![(0, 1), (2, 0)]);
        assert_eq!(edges, vec![(1, 2), (2, 1), (3, 0), (0, 3)]);
    }

    #[test]
    fn repeated_ordered_pair_is_rejected() {
        let connections = vec![connection(0, 1), connection(0, 1)];
        let err = classify_connections(&connections, 2).unwrap_err();
        assert_eq!(err, ConvertError::DuplicateConnection { tail: 0, head: 1 });
    }

    #[test]
    fn self_loop_is_rejected() {
        let connections = vec![connection(1, 1)];
        let err = classify_connections(&connections, 3).unwrap_err();
        assert_eq!(
            err,
            ConvertError::Range {
                tail: 1,
                head: 1,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn out_of_range_vertex_is_rejected() {
        let connections = vec![connection(0, 5)];
        let err = classify_connections(&connections, 3).unwrap_err();
        assert_eq!(
            err,
            ConvertError::Range {
                tail: 0,
                head: 5,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn last_piece_closes_at_horizon_end() {
        let pieces = normalize_travel_time(&connection(0, 1), 100);
        assert_eq!(
            pieces,
            vec![
                TravelTimePiece {
                    piece_end: 3,
                    speed: 2.0
                },
                TravelTimePiece {
                    piece_end: 100,
                    speed: 4.0
                },
            ]
        );
    }

    #[test]
    fn single_period_spans_the_whole_horizon() {
        let single = RawConnection {
            tail: 0,
            head: 1,
            distance: 7,
            demand: 0,
            period_count: 1,
            period_ends: vec![],
            period_speeds: vec![1.5],
        };
        let pieces = normalize_travel_time(&single, 240);
        assert_eq!(
            pieces,
            vec![TravelTimePiece {
                piece_end: 240,
                speed: 1.5
            }]
        );
    }

    #[test]
    fn piece_ends_are_strictly_increasing() {
        let many = RawConnection {
            tail: 0,
            head: 1,
            distance: 4,
            demand: 2,
            period_count: 3,
            period_ends: vec![10, 20],
            period_speeds: vec![1.0, 0.5, 2.0],
        };
        let pieces = normalize_travel_time(&many, 100);
        assert!(pieces.windows(2).all(|w| w[0].piece_end < w[1].piece_end));
    }

    #[test]
    fn build_instance_assembles_the_document() -> anyhow::Result<()> {
        let parsed = ParsedInstance {
            header: header(3),
            connections: vec![connection(0, 1), connection(1, 0), connection(1, 2)],
        };
        let document = build_instance(parsed)?;

        assert_eq!(document.instance_name, "test");
        assert_eq!(document.graph.vertex_count, 3);
        assert_eq!(document.graph.edges.len(), 2);
        assert_eq!(document.graph.arcs.len(), 1);
        assert_eq!(document.graph.arcs[0].tail, 1);
        assert_eq!(document.graph.arcs[0].head, 2);
        assert_eq!(document.graph.arcs[0].travel_time.last().unwrap().piece_end, 100);
        Ok(())
    }

    #[test]
    fn build_instance_rejects_duplicates_before_emitting() {
        let parsed = ParsedInstance {
            header: header(3),
            connections: vec![connection(0, 1), connection(0, 1)],
        };
        let err = build_instance(parsed).unwrap_err();
        assert_eq!(
            err.downcast::<ConvertError>().unwrap(),
            ConvertError::DuplicateConnection { tail: 0, head: 1 }
        );
    }
}
