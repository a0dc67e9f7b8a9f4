//! Graph membership, holds and configuration
//!
//! This test exercises:
//! - Graph add/remove and the refresh that runs before them
//! - Node lifetime under external holds and graph memberships
//! - Store configuration loaded from YAML files

use anyhow::Result;
use multigraph::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_add_and_remove_members() -> Result<()> {
    let mut store = GraphStore::new();
    let g = store.create_graph("molecule");
    let a = store.create_node("a");
    let b = store.create_node("b");

    store.add_to_graph(g, a)?;
    store.add_to_graph(g, b)?;
    assert_eq!(
        store.add_to_graph(g, a),
        Err(GraphError::AlreadyMember { graph: g, node: a })
    );
    assert_eq!(store.graph_nodes(g)?, vec![a, b]);

    store.remove_from_graph(g, a)?;
    assert!(store.has_node(a));
    assert!(!store.graph_contains(g, a));
    assert!(store.get_node(a).unwrap().graphs().is_empty());

    let err = store.remove_from_graph(g, a).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}

#[test]
fn test_membership_does_not_scope_edges() -> Result<()> {
    let mut store = GraphStore::new();
    let g = store.create_graph("g");
    let inside = store.create_node("inside");
    let outside = store.create_node("outside");
    store.add_to_graph(g, inside)?;
    store.add_child(inside, "x", outside)?;

    assert_eq!(store.children(inside)?, vec![outside]);
    assert_eq!(store.delete_incident_edges(g, inside)?, 1);
    assert_eq!(
        store.delete_incident_edges(g, outside),
        Err(GraphError::NotAMember { graph: g, node: outside })
    );
    Ok(())
}

#[test]
fn test_external_hold_keeps_member_alive() -> Result<()> {
    let mut store = GraphStore::new();
    let g = store.create_graph("g");
    let a = store.create_node("a");
    store.add_to_graph(g, a)?;

    store.retain_node(a)?;
    assert!(!store.release_node(a)?);
    assert_eq!(store.graph_nodes(g)?, vec![a]);

    assert!(!store.release_node(a)?);
    assert!(store.graph_nodes(g)?.is_empty());
    assert!(!store.has_node(a));
    Ok(())
}

#[test]
fn test_shared_member_survives_one_graph() -> Result<()> {
    let mut store = GraphStore::new();
    let g = store.create_graph("g");
    let h = store.create_graph("h");
    let a = store.create_node("a");
    store.add_to_graph(g, a)?;
    store.add_to_graph(h, a)?;
    store.release_node(a)?;

    let purged = store.delete_graph(g)?;
    assert!(purged.is_empty());
    assert!(store.get_graph(g).is_none());
    assert_eq!(store.get_node(a).unwrap().graphs(), &[h]);

    let purged = store.delete_graph(h)?;
    assert_eq!(purged, vec![a]);
    assert_eq!(store.node_count(), 0);
    Ok(())
}

#[test]
fn test_delete_node_scrubs_memberships() -> Result<()> {
    let mut store = GraphStore::new();
    let g = store.create_graph("g");
    let h = store.create_graph("h");
    let a = store.create_node("a");
    store.add_to_graph(g, a)?;
    store.add_to_graph(h, a)?;

    store.delete_node(a)?;
    assert!(!store.graph_contains(g, a));
    assert!(store.get_graph(h).unwrap().is_empty());
    store.verify_integrity()?;
    Ok(())
}

#[test]
fn test_delete_connected_member() -> Result<()> {
    let mut store = GraphStore::new();
    let g = store.create_graph("g");
    let hub = store.create_node("hub");
    let parent = store.create_node("parent");
    let child = store.create_node("child");
    for n in [hub, parent, child] {
        store.add_to_graph(g, n)?;
    }
    store.add_child(parent, "down", hub)?;
    store.add_child(hub, "down", child)?;
    store.add_child(child, "back", hub)?;

    store.delete_node(hub)?;

    assert_eq!(store.graph_nodes(g)?, vec![parent, child]);
    assert_eq!(store.get_node(parent).unwrap().degree(), 0);
    assert_eq!(store.get_node(child).unwrap().degree(), 0);
    assert!(!store.is_neighbor(parent, hub));
    assert_eq!(store.edge_count(), 0);
    store.verify_integrity()?;
    Ok(())
}

#[test]
fn test_graph_labels() {
    let mut store = GraphStore::new();
    let g = store.create_default_graph();
    let graph = store.get_graph_mut(g).unwrap();
    graph.add_label("ring");
    graph.set_name("benzene");

    let graph = store.get_graph(g).unwrap();
    assert!(graph.contains_label("ring"));
    assert_eq!(graph.name(), "benzene");
}

#[test]
fn test_config_from_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "edge_multiplicity: unique")?;
    writeln!(file, "default_node_name: atom")?;

    let config = StoreConfig::from_file(file.path())?;
    assert_eq!(config.edge_multiplicity, EdgeMultiplicity::Unique);

    let mut store = GraphStore::with_config(config);
    let a = store.create_default_node();
    let b = store.create_node("b");
    assert_eq!(store.get_node(a).unwrap().name(), "atom");

    store.add_child(a, "x", b)?;
    assert_eq!(
        store.add_child(a, "y", b).unwrap_err(),
        GraphError::DuplicateEdge { from: a, to: b }
    );
    Ok(())
}

#[test]
fn test_missing_config_file() {
    let result = StoreConfig::from_file("/nonexistent/multigraph.yaml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}
